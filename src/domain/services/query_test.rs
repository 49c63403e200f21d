use super::QueryState;
use super::QueryWorkflow;
use crate::domain::models::Answer;
use crate::domain::models::ClientError;
use crate::domain::models::Role;
use crate::domain::models::Turn;

#[test]
fn it_rejects_blank_questions() {
    let mut workflow = QueryWorkflow::default();

    let res = workflow.ask("   \n");
    assert!(matches!(res, Err(ClientError::Validation(_))));
    assert!(workflow.conversation().is_empty());
    assert_eq!(workflow.state(), QueryState::Idle);
}

#[test]
fn it_appends_the_trimmed_question() {
    let mut workflow = QueryWorkflow::default();

    let question = workflow.ask("  What is the refund policy?  ").unwrap();
    assert_eq!(question, "What is the refund policy?");
    assert_eq!(workflow.state(), QueryState::Asking);
    assert_eq!(
        workflow.conversation().last(),
        Some(&Turn::user("What is the refund policy?"))
    );
}

#[test]
fn it_rejects_a_second_question_while_asking() {
    let mut workflow = QueryWorkflow::default();
    workflow.ask("first").unwrap();

    let res = workflow.ask("second");
    assert!(matches!(res, Err(ClientError::Busy(_))));
    assert_eq!(workflow.conversation().len(), 1);
}

#[test]
fn it_appends_answers_in_order() {
    let mut workflow = QueryWorkflow::default();

    workflow.ask("first").unwrap();
    workflow.complete(Ok(Answer {
        text: "one".to_string(),
    }));
    workflow.ask("second").unwrap();
    workflow.complete(Ok(Answer {
        text: "two".to_string(),
    }));

    let turns = workflow
        .conversation()
        .turns()
        .iter()
        .map(|e| return format!("{}: {}", e.role, e.text))
        .collect::<Vec<String>>()
        .join("\n");
    insta::assert_snapshot!(turns, @r###"
    user: first
    assistant: one
    user: second
    assistant: two
    "###);
    assert_eq!(workflow.state(), QueryState::Idle);
}

#[test]
fn it_appends_an_error_turn_on_failure() {
    let mut workflow = QueryWorkflow::default();

    workflow.ask("first").unwrap();
    workflow.complete(Err(ClientError::Backend {
        status: 500,
        detail: Some("Knowledge base is empty".to_string()),
    }));
    workflow.ask("second").unwrap();
    workflow.complete(Err(ClientError::Backend {
        status: 500,
        detail: None,
    }));

    let turns = workflow.conversation().turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0], Turn::user("first"));
    assert_eq!(
        turns[1],
        Turn::assistant_error("Error: Knowledge base is empty")
    );
    assert_eq!(turns[3].role, Role::Assistant);
    assert_eq!(turns[3].text, "Error: Failed to get response");
    assert!(turns[3].is_error);
    assert_eq!(workflow.state(), QueryState::Idle);
}

#[test]
fn it_clears_the_conversation() {
    let mut workflow = QueryWorkflow::default();
    workflow.ask("first").unwrap();
    workflow.complete(Ok(Answer {
        text: "one".to_string(),
    }));

    workflow.clear_conversation();
    assert!(workflow.conversation().is_empty());
}

#[test]
fn it_keeps_a_late_reply_after_clearing() {
    let mut workflow = QueryWorkflow::default();
    workflow.ask("first").unwrap();
    workflow.clear_conversation();

    workflow.complete(Ok(Answer {
        text: "one".to_string(),
    }));
    assert_eq!(workflow.conversation().turns(), &[Turn::assistant("one")]);
}
