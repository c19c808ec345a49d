pub mod broadphase;
pub mod dispatch;
pub(crate) mod narrowphase;
pub mod shapes;
