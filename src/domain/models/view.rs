use strum::EnumIter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum View {
    Login,
    Register,
    Upload,
    Chat,
    Settings,
}

impl View {
    pub fn is_protected(&self) -> bool {
        return !matches!(self, View::Login | View::Register);
    }
}
