//! Embedded response templates
//!
//! Compiled into the binary; one template per outcome kind.

/// A freshly built plan
pub const PLANNED: &str = r#"Travel plan for {{subject}}
{{#if origin}}
Departing from {{origin}}
{{/if}}
Duration: {{duration_days}} day{{#if multi_day}}s{{/if}} for {{party_size}} traveler{{#if group}}s{{/if}}

Itinerary:
{{#each days}}
Day {{index}} - {{theme}}
{{#each slots}}
  {{label}}: {{text}}{{#if link}} ({{link}}){{/if}}
{{/each}}
{{/each}}
{{#if flights}}

Flights:
{{#each flights}}
  - {{this}}
{{/each}}
{{/if}}
{{#if hotels}}

Hotels:
{{#each hotels}}
  - {{this}}
{{/each}}
{{/if}}
{{#if overview}}

About {{subject}}:
{{#each overview}}
  - {{this}}
{{/each}}
{{/if}}
{{#if recommendations}}

Recommendations:
{{#each recommendations}}
  - {{this}}
{{/each}}
{{/if}}

Would you like more detail on any day, or changes to the plan?
"#;

/// Search results
pub const SEARCHED: &str = r#"Here's what I found for {{subject}}:
{{#each categories}}

{{name}}:
{{#each records}}
  {{rank}}. {{title}}{{#if link}} ({{link}}){{/if}}
{{/each}}
{{/each}}
{{#unless categories}}

No results were available right now. Try again in a moment.
{{/unless}}
"#;

/// A modified plan
pub const MODIFIED: &str = r#"{{#if updated}}
Updated your plan for {{subject}}:
{{#each changes}}
  Day {{day}} {{slot}}: {{after}}
{{/each}}
{{#each summary}}
  {{name}}: {{titles}}
{{/each}}
{{else}}
Your plan for {{subject}} is unchanged: nothing new matched that request.
{{/if}}
"#;

/// Look up an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "planned" => Some(PLANNED),
        "searched" => Some(SEARCHED),
        "modified" => Some(MODIFIED),
        _ => None,
    }
}
