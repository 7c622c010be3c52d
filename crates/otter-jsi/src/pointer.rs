//! Ownership primitive for engine-heap handles.

use std::any::Any;
use std::fmt;

/// Backend payload behind a heap handle.
///
/// Each implementation owns exactly one strong reference into the engine
/// heap and releases it when dropped. Backends recover their concrete type
/// through [`PointerValue::as_any`].
pub trait PointerValue: 'static {
    /// Release the engine reference. The default simply drops the payload.
    fn invalidate(self: Box<Self>) {}

    fn as_any(&self) -> &dyn Any;
}

/// Exclusive owner of one [`PointerValue`].
///
/// Moving a `Pointer` moves ownership. A `Pointer` may be empty after
/// [`Pointer::take`] or when a backend failed to produce a reference; all
/// runtime operations on an empty pointer fail softly.
pub struct Pointer {
    value: Option<Box<dyn PointerValue>>,
}

impl Pointer {
    pub fn new(value: Box<dyn PointerValue>) -> Self {
        Self { value: Some(value) }
    }

    pub fn from_option(value: Option<Box<dyn PointerValue>>) -> Self {
        Self { value }
    }

    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the payload.
    pub fn get(&self) -> Option<&dyn PointerValue> {
        self.value.as_deref()
    }

    /// Downcast the payload to a backend type.
    pub fn downcast<T: PointerValue>(&self) -> Option<&T> {
        self.get()?.as_any().downcast_ref::<T>()
    }

    /// Transfer ownership out, leaving this pointer empty.
    pub fn take(&mut self) -> Pointer {
        Pointer {
            value: self.value.take(),
        }
    }
}

impl Drop for Pointer {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            value.invalidate();
        }
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "Pointer({:p})", value.as_any()),
            None => f.write_str("Pointer(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<u32>>);

    impl PointerValue for Counted {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_drop_releases_once() {
        let released = Rc::new(Cell::new(0));
        let pointer = Pointer::new(Box::new(Counted(released.clone())));
        assert!(!pointer.is_empty());
        drop(pointer);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_take_transfers_ownership() {
        let released = Rc::new(Cell::new(0));
        let mut source = Pointer::new(Box::new(Counted(released.clone())));
        let target = source.take();

        assert!(source.is_empty());
        assert!(target.downcast::<Counted>().is_some());

        drop(source);
        assert_eq!(released.get(), 0);
        drop(target);
        assert_eq!(released.get(), 1);
    }
}
