use async_trait::async_trait;
use draw_model::RawDraw;

use crate::error::Result;

/// A single GET-and-parse cycle against one upstream source (component
/// E). Implementations own the HTTP client and the 8s deadline; parsing
/// is delegated to a pure `ParserId`-dispatched function in `draw-core`
/// so it stays side-effect free per spec.md section 4.2.
#[async_trait]
pub trait SourcePoll: Send + Sync {
    /// Returns `Ok(None)` on non-200, transport error, or "no record"
    /// from the parser -- all silently-dropped outcomes per spec.md
    /// section 4.2. Only a hard bug (e.g. misconfiguration) should
    /// surface as `Err`.
    async fn poll_once(&self) -> Result<Option<RawDraw>>;

    fn name(&self) -> &str;
}
