//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Docent Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# GEMINI_API_KEY is read from the environment (or a .env file), never from here.

[model]
# name = "gemini-1.5-flash-001"      # model bound to the context cache
# fallback = "gemini-1.5-flash"      # used when no document is present
# api_base = "https://generativelanguage.googleapis.com"
# max_tokens = 4096                  # 1-65536
# temperature = 0.7                  # 0.0-2.0
# request_timeout_secs = 120         # 5-600

[document]
# path = "document.pdf"
# required = false                   # true: missing document is fatal
# mime_type = "application/pdf"

[cache]
# enabled = true
# ttl_secs = 3600                    # 60-86400
# system_instruction = "You are an expert on the provided document. ..."

[chat]
# query_template = "Using the referenced document, {input}"
# max_tool_rounds = 10               # 1-50
#
# [[chat.seed_history]]
# role = "user"
# text = "Hello, I have loaded a document. Please help me understand its contents."
#
# [[chat.seed_history]]
# role = "model"
# text = "I'll help you understand the document. What would you like to know about it?"

[tools]
# enabled = true
# output_dir = "results"             # relative to the working directory
# extension = "txt"

[logging]
# level = "info"                     # debug, info, warn, error
"##
    .to_string()
}
