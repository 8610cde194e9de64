//! Prompt text for the repair loop.

use catalogist_core::tool::ToolDefinition;

/// Build the system prompt, listing the registry's tools.
pub fn system_prompt(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::from(
        "You are an expert at completing tables of contents for tender response documents.\n\
         \n\
         ## Task\n\
         Analyse the extracted catalog, add any module that is missing, and label every node with a category.\n\
         \n\
         ## Modules\n\
         - business: 商务标 (forms, declarations, certificates, qualification material)\n\
         - technical: 技术标 (solutions, measures, plans)\n\
         - pricing: 报价表 (prices, fees, quotations)\n\
         \n\
         ## Labelling rules\n\
         1. forms / templates / items to fill in or stamp -> business\n\
         2. solutions / measures / plans -> technical\n\
         3. quotations / prices / fees -> pricing\n\
         4. a node whose children belong to different modules -> mixed, then label the children individually\n\
         5. anything you cannot decide -> unknown\n\
         \n\
         ## Tools\n",
    );

    for tool in tools {
        prompt.push_str(&format!(
            "\n**{}**\n{}\nParameters: {}\n",
            tool.name, tool.description, tool.parameters
        ));
    }

    prompt.push_str(
        "\n## Workflow\n\
         1. Identify the module each existing node belongs to.\n\
         2. Decide which of business / technical / pricing is missing.\n\
         3. Call get_default_template for each missing module and append the template to the catalog.\n\
         4. Call update_node_category to label nodes. Paths look like \"root/商务标/投标函\".\n\
         5. Return the complete catalog.\n\
         \n\
         ## Output format\n\
         While working:\n\
         ```\n\
         Thought: <analysis>\n\
         Action: <tool name>\n\
         Action Input: {\"param\": \"value\"}\n\
         ```\n\
         When finished:\n\
         ```\n\
         Thought: <summary>\n\
         Final Answer: <complete JSON array of nodes>\n\
         ```\n\
         \n\
         ## Rules\n\
         - Only add modules that are really missing.\n\
         - Do not rename, drop or reorder extracted nodes.\n\
         - Keep content_description and any other fields as they are.\n\
         - Every node needs a name, a category and a children array.\n\
         - One Action per reply.\n",
    );

    prompt
}

/// The opening user message carrying the extracted catalog.
pub fn task_message(extraction_json: &str) -> String {
    format!(
        "Here is the catalog extracted from the tender's formatting requirements. Complete it:\n\n\
         ```json\n{extraction_json}\n```\n\n\
         Work step by step using the Thought / Action / Final Answer format."
    )
}

/// Feedback after a Final Answer that parsed but failed validation.
pub fn validation_feedback(errors: &[String]) -> String {
    format!(
        "Your Final Answer has the following problems:\n\n{}\n\n\
         Fix them and reply with a corrected Final Answer:\n\
         1. Output an array [...] or an object {{\"name\": \"root\", \"children\": [...]}}.\n\
         2. Every node must have a non-empty name.\n\
         3. Every node should have a category (business/technical/pricing/mixed/unknown).\n\
         4. Keep content_description and children as they were.",
        errors
            .iter()
            .map(|e| format!("- {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

/// Feedback after a Final Answer whose JSON could not be read.
pub fn final_answer_parse_feedback(reason: &str) -> String {
    format!(
        "Your Final Answer could not be parsed ({reason}).\n\n\
         Check that:\n\
         1. The JSON is complete and syntactically valid.\n\
         2. It is an array [...] or an object {{\"name\": \"root\", \"children\": [...]}}.\n\
         3. All strings use double quotes and there are no comments or trailing commas.\n\n\
         Reply with a corrected Final Answer."
    )
}

/// Feedback after an Action whose input was not a JSON object.
pub fn action_input_feedback(tool: &str, reason: &str) -> String {
    format!(
        "The Action Input for '{tool}' could not be parsed ({reason}). \
         Action Input must be a single JSON object, e.g. {{\"module_type\": \"pricing\"}}. \
         Try again or return a Final Answer."
    )
}

/// Nudge after a reply with neither an Action nor a Final Answer.
pub const CONTINUE_MESSAGE: &str = "Please continue: call a tool or return a Final Answer.";

/// Wrap a tool observation.
pub fn observation(text: &str) -> String {
    format!("Observation: {text}\n\nContinue the analysis, or return a Final Answer.")
}
