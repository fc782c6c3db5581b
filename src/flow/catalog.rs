//! Node definitions for the startup interview
//!
//! Each function builds a fresh, immutable descriptor. No hidden state: calling
//! a factory twice yields equal values.

use super::node::{FunctionName, FunctionSpec, NodeDescriptor, NodeId, PostAction};
use serde_json::json;

const PERSONA: &str = "You are a friendly interviewer collecting information about entrepreneurs \
    and their startup experiences. Your responses will be converted to audio, so keep them \
    conversational and avoid special characters. Always use the available functions to \
    progress the conversation.";

/// Descriptor for any node id
#[allow(dead_code)] // Graph inspection
pub fn node(id: NodeId) -> NodeDescriptor {
    match id {
        NodeId::Initial => initial(),
        NodeId::CollectHistory => collect_history(),
        NodeId::Summarize => summarize(),
        NodeId::End => end(),
    }
}

/// Greeting; asks for the participant's name
pub fn initial() -> NodeDescriptor {
    NodeDescriptor {
        id: NodeId::Initial,
        persona_instructions: vec![PERSONA.to_string()],
        task_instructions: vec![
            "Greet the user warmly and ask for their name. Explain that you're conducting a \
             brief interview about their startup experience."
                .to_string(),
        ],
        functions: vec![FunctionSpec {
            name: FunctionName::CollectName,
            description: "Record the user's name".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The user's full name"
                    }
                },
                "required": ["name"]
            }),
        }],
        post_actions: vec![],
    }
}

pub fn collect_history() -> NodeDescriptor {
    NodeDescriptor {
        id: NodeId::CollectHistory,
        persona_instructions: vec![],
        task_instructions: vec![
            "Now ask about their startup history. Be encouraging and ask them to share details \
             about any startups they've founded, worked at, or been involved with. Ask about \
             their roles, what the companies did, outcomes, and key learnings."
                .to_string(),
        ],
        functions: vec![FunctionSpec {
            name: FunctionName::CollectStartupHistory,
            description: "Record the user's startup history and experiences".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "startup_history": {
                        "type": "string",
                        "description": "Detailed description of the user's startup experience, \
                                        companies, roles, and outcomes"
                    }
                },
                "required": ["startup_history"]
            }),
        }],
        post_actions: vec![],
    }
}

pub fn summarize() -> NodeDescriptor {
    NodeDescriptor {
        id: NodeId::Summarize,
        persona_instructions: vec![],
        task_instructions: vec![
            "Thank the user for sharing their information. Provide a brief, encouraging summary \
             of what they shared. Then ask if there's anything else they'd like to add before \
             ending the call."
                .to_string(),
        ],
        functions: vec![FunctionSpec {
            name: FunctionName::EndCall,
            description: "Complete the interview and end the call".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }],
        post_actions: vec![],
    }
}

/// Terminal node: no functions, ends the session once spoken
pub fn end() -> NodeDescriptor {
    NodeDescriptor {
        id: NodeId::End,
        persona_instructions: vec![],
        task_instructions: vec![
            "Give a final thank you and mention that their information has been recorded. End \
             the conversation warmly."
                .to_string(),
        ],
        functions: vec![],
        post_actions: vec![PostAction::EndSession],
    }
}
