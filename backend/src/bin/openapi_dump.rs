//! Write the OpenAPI document for the `/api/v1` surface to stdout as JSON.
//!
//! ```text
//! cargo run --bin openapi_dump > openapi.json
//! ```

use std::io::{self, Write};

use color_eyre::eyre::{Context, Result};
use discovery_backend::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialise the OpenAPI document")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{document}").wrap_err("failed to write to stdout")?;
    Ok(())
}
