/// Base types and helpers to talk to SCPI-based instruments.
use crate::Error;

pub const DEFAULT_TERMINATION: &str = "\n";

#[derive(Clone, Debug, PartialEq)]
pub enum ScpiRequest {
    QueryString(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScpiResponse {
    String(String),
}

/// Append the default termination to an outgoing message unless it is already present.
pub fn terminate(msg: &str) -> String {
    let mut ret = msg.to_string();
    if !ret.ends_with(DEFAULT_TERMINATION) {
        ret.push_str(DEFAULT_TERMINATION);
    }
    ret
}

/// Strip the line termination (`\n` or `\r\n`) from a reply.
pub fn strip_termination(reply: &str) -> &str {
    reply.trim_end_matches(|c: char| c == '\n' || c == '\r')
}

/// Parse a reply to a `:MEASure...?` query as a single floating point reading.
///
/// Surrounding whitespace is ignored. Exponent notation as used by most meters
/// (e.g. `9.90000000E+37` on overload) as well as `inf` and `nan` are accepted.
pub fn parse_reading(reply: &str) -> crate::Result<f64> {
    let trimmed = reply.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::unexpected_response(format!("`{}` is not a numeric reading", trimmed)))
}
