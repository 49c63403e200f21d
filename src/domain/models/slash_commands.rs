#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_upload()
            || cmd.is_files()
            || cmd.is_remove()
            || cmd.is_submit()
            || cmd.is_drop()
            || cmd.is_settings()
            || cmd.is_set()
            || cmd.is_clear_chat()
            || cmd.is_clear_knowledge_base()
            || cmd.is_health()
            || cmd.is_logout()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_upload(&self) -> bool {
        return ["/u", "/upload"].contains(&self.command.as_str());
    }

    pub fn is_files(&self) -> bool {
        return ["/f", "/files"].contains(&self.command.as_str());
    }

    pub fn is_remove(&self) -> bool {
        return ["/rm", "/remove"].contains(&self.command.as_str());
    }

    pub fn is_submit(&self) -> bool {
        return ["/s", "/submit", "/ingest"].contains(&self.command.as_str());
    }

    pub fn is_drop(&self) -> bool {
        return ["/drop"].contains(&self.command.as_str());
    }

    pub fn is_settings(&self) -> bool {
        return ["/settings"].contains(&self.command.as_str());
    }

    pub fn is_set(&self) -> bool {
        return ["/set"].contains(&self.command.as_str());
    }

    pub fn is_clear_chat(&self) -> bool {
        return ["/c", "/clear"].contains(&self.command.as_str());
    }

    pub fn is_clear_knowledge_base(&self) -> bool {
        return ["/clearkb", "/clear-kb"].contains(&self.command.as_str());
    }

    pub fn is_health(&self) -> bool {
        return ["/health"].contains(&self.command.as_str());
    }

    pub fn is_logout(&self) -> bool {
        return ["/logout"].contains(&self.command.as_str());
    }

    /// Parses the first argument as a 1-based position and returns it
    /// 0-based.
    pub fn position_arg(&self) -> Option<usize> {
        let idx = self.args.first()?.parse::<usize>().ok()?;
        if idx == 0 {
            return None;
        }

        return Some(idx - 1);
    }
}
