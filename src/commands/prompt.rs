use std::io::{self, BufRead, Write};

/// Prints `prompt` to stderr and reads one trimmed line from stdin. `None`
/// when stdin is closed.
pub fn read_line(prompt: &str) -> io::Result<Option<String>> {
    read_line_from(&mut io::stdin().lock(), &mut io::stderr(), prompt)
}

fn read_line_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(
        answer.map(str::to_lowercase).as_deref(),
        Some("y") | Some("yes")
    )
}

/// Asks a yes/no question. Anything but `y`/`yes`, including a closed stdin,
/// is a no.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    Ok(is_yes(read_line(&format!("{prompt} [y/N]: "))?.as_deref()))
}
