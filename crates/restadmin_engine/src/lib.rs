/* 📖 # Why is the engine split into a registry and an augmentation model?

The REST service registry (`rest`) knows how generic REST services are laid out
in a module's configuration. The db-connected model (`db_connected`) adds one
configuration section per resource class and recasts fetched entities that have
one. The two only meet through the fetch events, so the registry can be used and
tested without any db-connected knowledge.
*/

pub mod config;
pub mod db_connected;
pub mod document;
pub mod entity;
pub mod events;
pub mod factory;
pub mod module;
pub mod rest;
pub mod skeleton;
pub mod store;

pub use config::{CONFIG_FILE_NAME, Config, ConfigFormat, ModuleConfig, load_config};
pub use db_connected::{DbConnectedFetchListener, DbConnectedRestServiceModel, try_augment};
pub use document::ConfigDocument;
pub use entity::{DbConnectedRestServiceEntity, Field, RestService, RestServiceEntity};
pub use events::{FetchEvent, FetchEvents, FetchListener};
pub use factory::ModelFactory;
pub use module::{ModuleDescriptor, ModuleRegistry};
pub use rest::{CreateOptions, DeleteMode, RestServiceModel};
pub use skeleton::{SkeletonGenerator, SkeletonKind};
pub use store::{ConfigStore, FileConfigStore, InMemoryConfigStore, StoreHandle};
