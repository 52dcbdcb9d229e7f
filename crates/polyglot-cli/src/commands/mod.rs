pub mod collect;
pub mod config;
pub mod history;
pub mod plugins;
pub mod recognize;
pub mod speak;
pub mod translate;
