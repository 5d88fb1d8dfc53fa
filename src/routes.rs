mod alpha;
mod health_check;
mod subscriptions;

use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;
pub use alpha::*;
pub use health_check::*;
pub use subscriptions::*;

/// `axum::Json` whose rejections become a [`SubscribeError`], so malformed
/// bodies get the same JSON error shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(SubscribeError))]
pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
