//! Channel permissions the bot and command authors need.

use {serenity::all::Permissions, thevoid_common::ChannelId};

/// What the bot needs in a void channel to see and delete messages.
pub const VOID_CHANNEL: Permissions = Permissions::VIEW_CHANNEL.union(Permissions::MANAGE_MESSAGES);

/// What a member needs to run `proxy` or `purge`.
pub const COMMAND_AUTHOR: Permissions = Permissions::MANAGE_MESSAGES;

/// Permissions in `required` that `granted` lacks.
#[must_use]
pub fn missing(required: Permissions, granted: Permissions) -> Permissions {
    if granted.administrator() {
        return Permissions::empty();
    }
    required.difference(granted)
}

/// Explain why `channel_id` cannot become a void channel.
pub fn describe_missing(channel_id: ChannelId, missing: Permissions) -> String {
    let mut text = format!(
        "Can not add <#{channel_id}> to the void channels.\n\
         `void` is missing the following critical permissions in <#{channel_id}> \
         which would prevent proper operation:\n"
    );
    for name in missing.get_permission_names() {
        text.push_str(&format!("**{name}**\n"));
    }
    text.push_str("\nPlease fix the permissions and try again or choose a different channel.");
    text
}
