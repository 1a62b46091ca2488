//! Easel Core Library
//!
//! Scene store, undoable commands, selection, tools and the project format
//! for the Easel drawing editor. Nothing here draws pixels; see `easel-render`.

pub mod codec;
pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod filter;
pub mod fonts;
pub mod history;
pub mod import;
pub mod observer;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod tools;

pub use codec::{FORMAT_VERSION, FormatError, FormatResult, ProjectFile, deserialize, serialize};
pub use command::Command;
pub use config::{ConfigError, ConfigResult, EditorConfig};
pub use editor::{Editor, ObserverHandle};
pub use error::{EditorError, EditorResult};
pub use filter::{FilterBackend, FilterError, FilterResult, ImageFilter};
pub use history::History;
pub use import::{DecodedImage, Decoder, ImportError, ImportQueue, ImportResult, ImportTicket};
pub use observer::{SceneChange, SceneObserver};
pub use scene::{MAX_CANVAS_SIZE, ObjectPatch, Restack, Scene, SceneError, SceneResult, canvas_size_ok};
pub use selection::{Corner, Handle, Selection, hit_test};
pub use shapes::{InvalidObject, ObjectId, SceneObject, SerializableColor, ShapeKind, ShapeStyle};
pub use snap::{GRID_SIZE, SnapMode, SnapResult, snap_point, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use tools::{InputEvent, ShapeTool, ToolKind, ToolManager, ToolState};
