mod app;
mod events;
mod input;
mod notices;
mod render;
mod runtime;

pub use app::{App, MainTab, Screen, ViewOptions};
pub use events::{forward_pushes, UiEvent};
pub use input::InputField;
pub use notices::NoticeQueue;
pub use runtime::Ui;
