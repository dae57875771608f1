//! Line input for the interactive prompt

use std::io::Write;

/// Prompt and read one line. `None` means stdin closed.
pub fn readline() -> Result<Option<String>, String> {
    write!(std::io::stdout(), "rampart> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut buffer = String::new();
    let bytes = std::io::stdin()
        .read_line(&mut buffer)
        .map_err(|e| e.to_string())?;
    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(buffer))
}
