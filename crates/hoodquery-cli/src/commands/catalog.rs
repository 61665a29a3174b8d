use serde_json::Value;

use hoodquery_core::Tool;

use crate::error::CliError;

pub fn run() -> Result<Value, CliError> {
    Ok(serde_json::to_value(Tool::ALL)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_tool_once() {
        let listed = run().expect("catalog should serialize");
        let entries = listed.as_array().expect("catalog is a list");
        assert_eq!(entries.len(), Tool::ALL.len());
        assert_eq!(entries[0]["name"], "robinhood_get_portfolio");
        assert_eq!(entries[11]["name"], "robinhood_search_symbols");
        assert_eq!(
            entries[11]["description"],
            "Search for stock symbols by company name or ticker."
        );
    }
}
