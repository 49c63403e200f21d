#[cfg(test)]
#[path = "turn_test.rs"]
mod tests;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub is_error: bool,
}

impl Turn {
    pub fn user(text: &str) -> Turn {
        return Turn {
            role: Role::User,
            text: text.to_string(),
            is_error: false,
        };
    }

    pub fn assistant(text: &str) -> Turn {
        return Turn {
            role: Role::Assistant,
            text: text.to_string(),
            is_error: false,
        };
    }

    pub fn assistant_error(text: &str) -> Turn {
        return Turn {
            role: Role::Assistant,
            text: text.to_string(),
            is_error: true,
        };
    }
}

/// Append-only log of turns. Past turns are never edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        return &self.turns;
    }

    pub fn last(&self) -> Option<&Turn> {
        return self.turns.last();
    }

    pub fn len(&self) -> usize {
        return self.turns.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.turns.is_empty();
    }
}
