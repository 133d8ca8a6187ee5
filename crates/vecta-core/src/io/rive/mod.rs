//! Loading of rive binary files.

pub mod animated;
pub mod loader;

pub use loader::RiveLoader;

use crate::error::Result;
use crate::model::Document;
use vecta_data::rive::read_file;
use vecta_data::Diagnostics;

/// Major version this loader understands.
pub const SUPPORTED_MAJOR: u64 = 7;

pub fn load(data: &[u8], diagnostics: &mut dyn Diagnostics) -> Result<Document> {
    let file = read_file(data, &mut *diagnostics)?;
    if file.header.major != SUPPORTED_MAJOR {
        diagnostics.warning(format!(
            "Unsupported rive version {}.{}, loading anyway",
            file.header.major, file.header.minor
        ));
    }
    Ok(RiveLoader::new(file, diagnostics).load())
}
