use crate::Context;

pub mod help;
pub mod info;
pub mod info_channel;
pub mod status;

pub(crate) fn get_bot_avatar(ctx: Context<'_>) -> String {
    ctx.cache().current_user().face()
}
