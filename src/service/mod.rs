pub mod allocator;
pub mod lifecycle;
pub mod notification;
pub mod scoping;
