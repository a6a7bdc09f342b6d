//! Trait for components that can be advanced by clock cycles.

use crate::Ticks;

/// A component that can be advanced by clock cycles.
///
/// This is the core abstraction for cycle-accurate emulation: a component
/// does one cycle's worth of work per `tick()`, and an external driver may
/// stop and inspect state between any two ticks.
pub trait Tickable {
    /// Advance the component by one clock cycle.
    fn tick(&mut self);

    /// Advance the component by multiple cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
