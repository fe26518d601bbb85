use std::fs;
use std::path::Path;

use log::info;
use similar::{DiffTag, TextDiff};

use crate::error::{Error, Result};

/// Compare two text files line by line after dropping the first `skip` lines
/// of each. Returns true iff the remaining lines are identical. When they are
/// not, the full unified diff is logged at info level.
pub fn text_files_match(golden_path: &Path, new_path: &Path, skip: usize) -> Result<bool> {
    let golden = read_lines_after(golden_path, skip)?;
    let new = read_lines_after(new_path, skip)?;

    let diff = TextDiff::from_lines(&golden, &new);
    let identical = diff.ops().iter().all(|op| op.tag() == DiffTag::Equal);

    if !identical {
        let unified = diff
            .unified_diff()
            .header(
                &golden_path.display().to_string(),
                &new_path.display().to_string(),
            )
            .to_string();
        info!("Text diff found:\n{}", unified);
    }

    Ok(identical)
}

fn read_lines_after(path: &Path, skip: usize) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    Ok(text.split_inclusive('\n').skip(skip).collect())
}
