//! Grid domain — тайловый мир, mutation events, подписки
//!
//! Содержит:
//! - CellCoord / TileId / GridLayout (адресация ячеек и маппинг в world space)
//! - GridWorld (Resource: тайлы + pending изменения)
//! - MutationFeed (явные подписки на batch'и изменений)
//! - SetTileIntent (event: edit ячейки от gameplay/UI)

pub mod coord;
pub mod events;
pub mod feed;
pub mod world;

pub use coord::*;
pub use events::*;
pub use feed::*;
pub use world::*;
