use crate::types::ApiMessage;

/// How many prior conversation turns accompany a continuation request.
///
/// The cap bounds request size so long sessions do not push the model into
/// truncating its answer. It is applied in exactly one place (here); the
/// caller passes history untrimmed.
pub const DEFAULT_HISTORY_CAP: usize = 6;

/// Default instructions for the completion endpoint. The studio expects the
/// answer to carry one complete single-file web application in a fenced
/// `html` block, so the prompt is explicit about format and completeness.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert full-stack web developer. You build complete, working,
single-file web applications.

Rules:
1. Always write the FULL code. Never elide lines, never stop midway, and
   never leave placeholder comments in place of real code.
2. Produce a SINGLE index.html file containing all markup, CSS inside a
   <style> tag and JavaScript inside a <script> tag.
3. Verify that every tag you open is closed before you finish.
4. Give the app a polished, modern look.
5. If the request is vague, build a complete working example anyway.

Answer with a short sentence, then exactly one fenced code block:

```html
<!DOCTYPE html>
...
```
";

/// Assemble the outbound message list for one completion turn:
/// system prompt, then the most recent `cap` history entries, then the new
/// user prompt. History never includes an in-progress response; the caller
/// supplies only completed turns.
pub fn build_request_messages(
    system_prompt: &str,
    history: &[ApiMessage],
    prompt: &str,
    cap: usize,
) -> Vec<ApiMessage> {
    let recent = &history[history.len().saturating_sub(cap)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ApiMessage::system(system_prompt));
    messages.extend_from_slice(recent);
    messages.push(ApiMessage::user(prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiRole;

    fn turns(n: usize) -> Vec<ApiMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ApiMessage::user(format!("prompt {}", i))
                } else {
                    ApiMessage::assistant(format!("answer {}", i))
                }
            })
            .collect()
    }

    #[test]
    fn system_first_prompt_last() {
        let messages = build_request_messages("sys", &turns(2), "next", 6);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ApiRole::System);
        assert_eq!(messages[0].content, "sys");
        assert_eq!(messages[3].role, ApiRole::User);
        assert_eq!(messages[3].content, "next");
    }

    #[test]
    fn history_is_capped_to_most_recent() {
        let messages = build_request_messages("sys", &turns(10), "next", 6);

        // system + 6 history + prompt
        assert_eq!(messages.len(), 8);
        // the oldest retained entry is turn 4
        assert_eq!(messages[1].content, "prompt 4");
        assert_eq!(messages[6].content, "answer 9");
    }

    #[test]
    fn short_history_is_kept_whole() {
        let messages = build_request_messages("sys", &turns(3), "next", 6);
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[1].content, "prompt 0");
    }

    #[test]
    fn empty_history_yields_system_and_prompt() {
        let messages = build_request_messages("sys", &[], "first", 6);
        assert_eq!(messages.len(), 2);
    }
}
