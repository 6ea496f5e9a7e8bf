//! Configuration section definitions.
//!
//! Each module corresponds to a section in `assetline.toml`:
//!
//! | Module      | TOML Section  | Purpose                                |
//! |-------------|---------------|----------------------------------------|
//! | `styles`    | `[styles]`    | SCSS entry, output, inlining, prefixes |
//! | `scripts`   | `[scripts]`   | Script glob, output, lowering target   |
//! | `sprites`   | `[sprites]`   | Sprite sources and generated outputs   |
//! | `cachebust` | `[cachebust]` | Templates with `?v=` markers           |
//! | `serve`     | `[serve]`     | Live reload proxy and WebSocket        |
//! | `watch`     | `[watch]`     | Polling and debounce                   |

mod cachebust;
mod scripts;
mod serve;
mod sprites;
mod styles;
mod watch;

pub use cachebust::CacheBustConfig;
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use sprites::SpritesConfig;
pub use styles::{InlineRule, StylesConfig};
pub use watch::WatchConfig;
