//! Checked upcasts from component types to capability types.
//!
//! A component registered under `ComponentKey<C>` can be exposed as a
//! capability `A` only if `C: Capability<A>`. Every type is trivially its own
//! capability; exposing a concrete component as a trait object takes one
//! `impl` (or the [`capability!`](crate::capability!) macro), so the
//! conversion is checked by the compiler instead of cast at runtime.

use std::rc::Rc;

/// Conversion of a shared component into a shared capability `A`.
pub trait Capability<A: ?Sized> {
    /// Upcast the shared component.
    fn into_capability(self: Rc<Self>) -> Rc<A>;
}

impl<A: ?Sized> Capability<A> for A {
    fn into_capability(self: Rc<Self>) -> Rc<A> {
        self
    }
}

/// Implement [`Capability`] for a concrete type and one or more trait objects
/// it implements.
///
/// ```rust
/// use tether_component::capability;
///
/// trait Tank { fn amount(&self) -> u32; }
/// struct Barrel(u32);
/// impl Tank for Barrel { fn amount(&self) -> u32 { self.0 } }
///
/// capability!(Barrel => dyn Tank);
/// ```
#[macro_export]
macro_rules! capability {
    ($component:ty => $($api:ty),+ $(,)?) => {
        $(
            impl $crate::Capability<$api> for $component {
                fn into_capability(self: ::std::rc::Rc<Self>) -> ::std::rc::Rc<$api> {
                    self
                }
            }
        )+
    };
}
