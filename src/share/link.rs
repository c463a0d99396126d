use crate::error::CodecError;
use crate::sequencer::Grid;

use super::codec;

/// Query parameter carrying the share token
pub const SHARE_PARAM: &str = "d";

/// Share URLs of the form `<base>?d=<token>`
pub struct ShareLink;

impl ShareLink {
    /// Append the grid's token to a base URL, replacing any existing query
    pub fn build(base: &str, grid: &Grid) -> Result<String, CodecError> {
        let token = codec::encode(grid)?;
        let base = base.split(['?', '#']).next().unwrap_or(base);
        Ok(format!("{}?{}={}", base, SHARE_PARAM, token))
    }

    /// Extract the token from a URL, a bare query string, or a bare token.
    /// Returns None when a URL or query string has no `d` parameter.
    pub fn token(input: &str) -> Option<String> {
        let input = input.trim();
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None if input.contains('=') || input.contains('&') => input,
            None => return Some(input.to_string()).filter(|t| !t.is_empty()),
        };
        let query = query.split('#').next().unwrap_or(query);
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == SHARE_PARAM)
            .map(|(_, value)| value.to_string())
    }

    /// Grid carried by a link. Absent or malformed `d` gives an all-off grid.
    pub fn parse(input: &str, rows: usize, cols: usize) -> Grid {
        match Self::token(input) {
            Some(token) => codec::decode_for(&token, rows, cols),
            None => Grid::new(rows, cols),
        }
    }
}
