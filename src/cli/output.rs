//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{DocdexArgs, OutputFormat};
use crate::error::Result;
use crate::inventory::Topic;

/// Result structure for source registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddResult {
    pub url: String,
}

/// Result structure for name resolution.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResults {
    pub name: String,
    pub topics: Vec<Topic>,
}

/// Result structure for the sources listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourcesResult {
    pub urls: Vec<String>,
}

/// Print a result either as a human-readable line or as serialized JSON,
/// depending on the selected output format.
pub fn output_result<T: Serialize>(human: &str, payload: &T, args: &DocdexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 && !human.is_empty() {
                println!("{human}");
            }
        }
        OutputFormat::Json => {
            let rendered = if args.pretty {
                serde_json::to_string_pretty(payload)?
            } else {
                serde_json::to_string(payload)?
            };
            println!("{rendered}");
        }
    }
    Ok(())
}

/// Render one topic as a human-readable line. `long` adds the doctype,
/// project, and version columns.
pub fn format_topic(topic: &Topic, long: bool) -> String {
    if long {
        let mut line = format!("{}\t{}", topic.doctype, topic.location);
        if !topic.project.is_empty() {
            line.push_str(&format!("\t{}", topic.project));
            if !topic.version.is_empty() {
                line.push_str(&format!(" {}", topic.version));
            }
        }
        line
    } else {
        topic.location.clone()
    }
}
