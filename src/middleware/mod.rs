/// Middleware module
///
/// The session gate that guards every inventory route.

mod session_gate;

pub use session_gate::SessionGate;
