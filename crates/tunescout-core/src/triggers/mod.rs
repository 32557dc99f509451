pub mod hover;
pub mod restoration;
pub mod scroll;

pub use hover::HoverPrefetcher;
pub use restoration::{ScrollOffset, ScrollRestoration};
pub use scroll::ScrollLoader;
