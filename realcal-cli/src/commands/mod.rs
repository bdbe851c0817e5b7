pub mod config;
pub mod new;
pub mod rescan;
pub mod show;
pub mod trash;
pub mod watch;

use realcal_core::store::normalize_path;
use realcal_core::view::EmbedOptions;
use realcal_core::ViewMode;

/// View filters from command line flags.
pub fn view_options(view: ViewMode, folder: Option<String>, hide_completed: bool) -> EmbedOptions {
    EmbedOptions {
        view: Some(view),
        show_completed: hide_completed.then_some(false),
        folder: folder.map(|f| normalize_path(&f)).filter(|f| !f.is_empty()),
    }
}
