//! Prompt templates for the discovery pipeline.
//!
//! Each stage has a fixed instruction template with `{PLACEHOLDER}`
//! substitution. The decision rules and confidence bands in the analysis
//! prompt are instructions to the model, not invariants enforced in code.

use crate::error::{DiscoveryError, Result};
use crate::types::source::AccessMethod;

/// Prompt for turning a dataset description into one search query.
pub const QUERY_GEN_PROMPT: &str = r#"You are a search query optimizer. Given a description of a dataset, generate a single, highly effective search query to find direct links to that data (CSV, JSON, data portals).
DO NOT include any commentary, just the query.

Dataset Description: "{DESCRIPTION}""#;

/// Fallback prompt asking the model for candidate URLs directly, used when
/// the search provider path fails entirely.
pub const DISCOVERY_FALLBACK_PROMPT: &str = r#"Find 5-8 candidate URLs for datasets related to: {DESCRIPTION}

Return a JSON object: { "urls": ["https://...", ...] }"#;

/// Prompt for classifying a URL's access method from fetched metadata.
pub const ANALYSIS_PROMPT: &str = r#"You are an expert web analyst. Determine the most efficient, programmatic way to access the primary dataset at this URL.

**URL:** {URL}
**METADATA:**
- Status Code: {STATUS}
- Content-Type: {CONTENT_TYPE}
- Content-Length: {CONTENT_LENGTH} bytes
- Is Downloadable Link (Detected): {IS_DOWNLOADABLE}

**CONTENT SNIPPET (first 2000 chars):**
```
{SNIPPET}
```

**DECISION RULES (in priority order):**
1. DIRECT_DOWNLOAD (confidence 90-100): URL ends in a data extension (.csv .json .xlsx .zip .parquet .xml .gz), or the snippet is raw data.
2. DIRECT_DOWNLOAD (confidence 70-89): the page exposes an explicit download link for the data.
3. API (confidence 70-100): URL path contains /api/, the snippet is API documentation, or the content is machine-structured JSON records.
4. WEB_CRAWL (confidence 50-69): data is embedded in HTML tables or behind navigation. Use confidence below 50 only if genuinely uncertain.

Respond with a JSON object:
- "accessMethod": one of "DIRECT_DOWNLOAD", "API", "WEB_CRAWL"
- "target": the actual data URL or API endpoint (may equal the original)
- "justification": one-sentence explanation based on the metadata/content
- "confidence": number 0-100"#;

/// Strategy prompt for a directly downloadable file.
pub const STRATEGY_DOWNLOAD_PROMPT: &str = r#"You are a data engineer. A user needs to download a file.
**Download URL:** {TARGET}
**Task:** Provide a simple, single-line `curl` command to download this file.
**Output:** A JSON object with keys: "snippet" (the curl command), "confidence" (number 0-100), "confidenceReason" (one sentence)."#;

/// Strategy prompt for an API endpoint.
pub const STRATEGY_API_PROMPT: &str = r#"You are a senior API developer. A user wants to access data from an API.
**API Endpoint:** {TARGET}
**Task:**
1. Provide a sample JavaScript `fetch` request for this endpoint.
2. Propose a simple, likely JSON schema for the returned data.
**Output:** A JSON object with keys: "snippet" (the fetch request), "schema" (stringified JSON schema), "confidence" (number 0-100), "confidenceReason" (one sentence)."#;

/// Strategy prompt for a site that must be crawled.
pub const STRATEGY_CRAWL_PROMPT: &str = r#"You are a web scraping expert. A user needs to crawl a website.
**Target URL:** {TARGET}
**Task:**
1. Provide a complete, tailored crawl configuration as JSON for this URL. The 'url' field must be the target URL. Set 'maxDepth', 'waitFor', 'onlyMainContent' based on a reasonable guess for this type of site.
2. Propose a JSON schema for the data you expect to extract from this source.
**Output:** A JSON object with keys: "config" (stringified crawl config), "schema" (stringified JSON schema), "confidence" (number 0-100), "confidenceReason" (one sentence)."#;

/// Strategy prompt for an uploaded local file.
pub const STRATEGY_FILE_PROMPT: &str = r#"You are a data engineer. A user has uploaded a local file.
**File Name:** {FILE_NAME}
**Content Sample:**
---
{CONTENT_SAMPLE}
---
**Task:**
1. Provide a Python script using a suitable library (pandas for CSV, `json` for JSON) that loads the file and prints the first 5 rows or the basic structure.
2. Propose a simple, likely JSON schema for the data based on the sample.
**Output:** A JSON object with keys: "snippet" (the Python script), "schema" (stringified JSON schema), "confidence" (number 0-100), "confidenceReason" (one sentence)."#;

/// Prompt for generating cleaning steps from user instructions.
pub const REFINEMENT_PROMPT: &str = r#"You are an expert data pipeline architect. Create a set of data cleaning and transformation steps based on user instructions, using an existing ingestion strategy as context.

**CRITICAL INSTRUCTIONS:**
1. **Generate Steps:** Read the user's cleaning instructions and produce a clear, step-by-step cleaning process.
2. **Suggest Tools:** Suggest appropriate tools or libraries (pandas, shell commands like `sed`/`awk`).
3. **Use Markdown:** Format the response as markdown bullet points.
4. **Output ONLY the Steps:** No titles, introductions, or pleasantries.

---
**Context (the original ingestion strategy):**
```json
{STRATEGY_CONTEXT}
```
---

**User's Cleaning & Transformation Instructions:**
"{INSTRUCTIONS}""#;

/// Prompt asking the model to repair malformed structured output.
pub const REPAIR_PROMPT: &str = r#"You are a quality assurance agent. Validate and fix a response from another agent in a data pipeline.

**Original Agent Task:** {TASK_DESCRIPTION}
**Agent Output to Validate:**
```json
{AGENT_OUTPUT}
```

**Your Tasks:**
1. Check that the JSON is valid and complete
2. Fix truncated strings or missing brackets
3. Ensure all required fields are present
4. Remove obvious hallucinations

**Required Output Fields:** {REQUIRED_FIELDS}

If the output is unfixable, generate a reasonable fallback response based on the task description.
Return ONLY valid JSON matching the expected shape."#;

/// Format the query generation prompt.
pub fn format_query_gen_prompt(description: &str) -> String {
    QUERY_GEN_PROMPT.replace("{DESCRIPTION}", description)
}

/// Format the direct-discovery fallback prompt.
pub fn format_discovery_fallback_prompt(description: &str) -> String {
    DISCOVERY_FALLBACK_PROMPT.replace("{DESCRIPTION}", description)
}

/// Format the analysis prompt from fetched URL metadata.
pub fn format_analysis_prompt(metadata: &crate::traits::analyzer::UrlMetadata) -> String {
    ANALYSIS_PROMPT
        .replace("{URL}", &metadata.url)
        .replace("{STATUS}", &metadata.status_code.to_string())
        .replace("{CONTENT_TYPE}", &metadata.content_type)
        .replace("{CONTENT_LENGTH}", &metadata.content_length.to_string())
        .replace(
            "{IS_DOWNLOADABLE}",
            if metadata.is_downloadable { "YES" } else { "NO" },
        )
        .replace("{SNIPPET}", &metadata.content_snippet)
}

/// Format the strategy prompt for a URL-based access method.
///
/// `LocalFile` has no URL template; requesting it here is a caller bug and
/// fails fast. Use [`format_file_strategy_prompt`] instead.
pub fn format_strategy_prompt(method: AccessMethod, target: &str) -> Result<String> {
    let template = match method {
        AccessMethod::DirectDownload => STRATEGY_DOWNLOAD_PROMPT,
        AccessMethod::Api => STRATEGY_API_PROMPT,
        AccessMethod::WebCrawl => STRATEGY_CRAWL_PROMPT,
        AccessMethod::LocalFile => {
            return Err(DiscoveryError::NoStrategyTemplate {
                method: method.to_string(),
            })
        }
    };
    Ok(template.replace("{TARGET}", target))
}

/// Format the local-file strategy prompt.
pub fn format_file_strategy_prompt(file_name: &str, content_sample: &str) -> String {
    STRATEGY_FILE_PROMPT
        .replace("{FILE_NAME}", file_name)
        .replace("{CONTENT_SAMPLE}", content_sample)
}

/// Format the refinement prompt.
pub fn format_refinement_prompt(strategy_context: &str, instructions: &str) -> String {
    REFINEMENT_PROMPT
        .replace("{STRATEGY_CONTEXT}", strategy_context)
        .replace("{INSTRUCTIONS}", instructions)
}

/// Format the repair prompt.
pub fn format_repair_prompt(task_description: &str, output: &str, required_fields: &[&str]) -> String {
    REPAIR_PROMPT
        .replace("{TASK_DESCRIPTION}", task_description)
        .replace("{AGENT_OUTPUT}", output)
        .replace("{REQUIRED_FIELDS}", &required_fields.join(", "))
}
