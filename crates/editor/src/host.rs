use futures::FutureExt as _;
use futures::future::LocalBoxFuture;

use crate::image::FileHandle;

/// User-facing capabilities the editor borrows from the surrounding app.
pub trait Host {
    /// Asks for a link URL. `None` or an empty answer cancels.
    fn prompt_url(&self, message: &str) -> LocalBoxFuture<'_, Option<String>>;

    /// Lets the user choose an image to insert.
    fn pick_image(&self) -> LocalBoxFuture<'_, Option<Box<dyn FileHandle>>> {
        futures::future::ready(None).boxed_local()
    }

    /// Shows an error toast.
    fn notify_error(&self, message: &str);
}
