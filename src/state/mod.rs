// ============================================================================
// STATE MODULE - Rc<RefCell> state + subscriber notifications
// ============================================================================

pub mod card_state;
pub mod cart_state;
pub mod reactivity;

pub use card_state::*;
pub use cart_state::*;
pub use reactivity::*;
