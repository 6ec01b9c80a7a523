use avatar_brain::{KeywordLlm, LlmClient, LlmError, LlmSettings};
use futures::executor::block_on;

#[test]
fn picks_actions_in_order_including_two_word_names() {
    let llm = KeywordLlm::new();
    let response = llm.interpret("Can you dance and then run across the stage?");

    let tool = response.tool_result.unwrap();
    assert_eq!(tool.actions, vec!["DANCE".to_string(), "RUN_ACROSS".to_string()]);
    assert_eq!(tool.emotion, None);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_0"));
    assert_eq!(response.text, "Watch me dance and run across!");
}

#[test]
fn expression_words_set_the_emotion() {
    let llm = KeywordLlm::new();
    let tool = llm.interpret("I'm so happy, jump!").tool_result.unwrap();

    assert_eq!(tool.actions, vec!["HAPPY".to_string(), "JUMP".to_string()]);
    assert_eq!(tool.emotion.as_deref(), Some("HAPPY"));
}

#[test]
fn small_talk_gets_a_text_only_reply() {
    let llm = KeywordLlm::new();
    let response = llm.interpret("how are you today?");

    assert!(response.tool_result.is_none());
    assert!(!response.text.is_empty());
}

#[test]
fn send_counts_calls_and_rejects_empty_messages() {
    let llm = KeywordLlm::new();

    let first = block_on(llm.send(Vec::new(), "wave".to_string(), LlmSettings::default())).unwrap();
    assert_eq!(first.tool_result.unwrap().tool_call_id.as_deref(), Some("call_0"));

    let second = block_on(llm.send(Vec::new(), "bow".to_string(), LlmSettings::default())).unwrap();
    assert_eq!(second.tool_result.unwrap().tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(llm.calls(), 2);

    let err = block_on(llm.send(Vec::new(), "  ".to_string(), LlmSettings::default())).unwrap_err();
    assert!(matches!(err, LlmError::Request(_)));
    assert_eq!(llm.calls(), 2);
}
