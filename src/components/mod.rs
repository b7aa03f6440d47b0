pub mod app;
pub mod drag;
pub mod sidebar;
pub mod study_list;
pub mod viewer;
pub mod viewport;
