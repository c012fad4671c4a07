pub(crate) mod command_line;
pub(crate) mod constants;
pub(crate) mod deserialize;
pub(crate) mod settings;
