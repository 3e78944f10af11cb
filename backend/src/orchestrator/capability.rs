//! Destination capabilities
//!
//! What a destination can do, described for the extraction prompt.

use serde::{Deserialize, Serialize};

/// Declared domain and abilities of a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationCapability {
    /// Destination type name
    pub agent_type: String,
    /// One-paragraph description
    pub description: String,
    /// Business domains the destination covers
    pub primary_domains: Vec<String>,
    /// Operations it can perform
    pub key_functions: Vec<String>,
    /// Example commands it understands
    pub example_commands: Vec<String>,
    /// Other destinations it may need to work with
    #[serde(default)]
    pub collaboration_needs: Vec<String>,
}

impl DestinationCapability {
    /// Render the capability as a tool description for the model
    pub fn format_for_prompt(&self) -> String {
        let body = serde_json::to_string_pretty(self).unwrap_or_else(|_| self.description.clone());
        format!(
            "Specialized destination that provides the following capabilities:\n\n{}\n",
            body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_prompt_embeds_json() {
        let capability = DestinationCapability {
            agent_type: "Inventory".to_string(),
            description: "Keeps stock counts".to_string(),
            primary_domains: vec!["inventory".to_string()],
            key_functions: vec!["update_inventory".to_string()],
            example_commands: vec!["set coffee stock to 10".to_string()],
            collaboration_needs: vec![],
        };
        let rendered = capability.format_for_prompt();
        assert!(rendered.contains("\"agent_type\": \"Inventory\""));
        assert!(rendered.contains("update_inventory"));
        assert!(rendered.contains("\"collaboration_needs\": []"));
    }
}
