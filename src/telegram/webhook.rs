//! Webhook update handling.
//!
//! Each update is handled on its own: the text is classified, acted on, and
//! at most one reply is sent back to the chat.

use super::{
    BotApi, Update, escape_markdown,
    expense::{ParsedExpense, parse_expense},
};
use crate::{
    ai::{
        LanguageModel,
        advisor::{AdvisorContext, ask_advisor, categorize},
    },
    core::{
        category::Category,
        profile::find_by_telegram_chat,
        report::{format_money, format_transaction_line},
        telegram_link::{CodeStatus, LINK_CODE_TTL_MINUTES, check_code, create_pending_link, looks_like_code},
        transaction::{NewTransaction, Source, create_transaction, recent_transactions},
    },
    entities::profile,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

/// Recent transactions given to the advisor.
const ADVISOR_TRANSACTIONS: u64 = 5;
/// Characters of the original message kept in the description.
const DESCRIPTION_CHARS: usize = 100;

const NOT_LINKED: &str = "Your Telegram account is not linked yet. Send /start to get a link code.";
const NO_ADVISOR: &str = "The advisor is not available right now. Please try again later.";
const SAVE_FAILED: &str = "❌ Could not save expense. Try again.";

/// What a webhook handler needs.
#[derive(Clone, Copy)]
pub struct WebhookContext<'a> {
    /// Database
    pub db: &'a DatabaseConnection,
    /// Outgoing Bot API; replies are dropped when `None`
    pub bot: Option<&'a dyn BotApi>,
    /// Language model for categorization and questions
    pub model: Option<&'a dyn LanguageModel>,
    /// Bot username shown in the welcome text
    pub bot_username: Option<&'a str>,
}

/// Sender of a message.
#[derive(Debug, Clone, Default)]
pub struct Sender {
    /// Chat id
    pub chat_id: i64,
    /// Telegram username
    pub username: Option<String>,
    /// First name
    pub first_name: Option<String>,
}

fn welcome_text(code: &str, first_name: Option<&str>, bot_username: Option<&str>) -> String {
    let greeting = first_name.map_or_else(|| "Hi!".to_string(), |n| format!("Hi {}!", escape_markdown(n)));
    let bot = bot_username.map_or_else(String::new, |u| format!(" (@{})", escape_markdown(u)));
    format!(
        "👋 {greeting} Welcome to Sentinel{bot}.\n\n\
         Your link code is *{code}*\n\
         Enter it in the Sentinel dashboard within {LINK_CODE_TTL_MINUTES} minutes to connect this chat.\n\n\
         Once linked you can:\n\
         • Log an expense: `Lunch 2500`\n\
         • Ask a question: `How am I doing this month?`"
    )
}

const HELP_TEXT: &str = "*Sentinel bot*\n\n\
    /start - get a code to link this chat\n\
    /link <code> - check a link code\n\
    /help - show this message\n\n\
    Send `Lunch 2500` to log an expense, or ask any money question.";

async fn code_reply(ctx: WebhookContext<'_>, code: &str) -> Result<String> {
    Ok(match check_code(ctx.db, code).await? {
        CodeStatus::Valid(_) => {
            "✅ Code accepted. Confirm it in the Sentinel dashboard to finish linking.".to_string()
        }
        CodeStatus::Expired => "⌛ That code has expired. Send /start for a new one.".to_string(),
        CodeStatus::Unknown => "❓ Code not recognised. Send /start to get a new one.".to_string(),
    })
}

async fn log_expense(
    ctx: WebhookContext<'_>,
    profile: &profile::Model,
    parsed: ParsedExpense,
    text: &str,
) -> Result<String> {
    let category = match ctx.model {
        Some(model) => categorize(model, &parsed.merchant, parsed.amount, None)
            .await
            .unwrap_or_else(|e| {
                warn!("Categorization failed: {e}");
                Category::Other
            }),
        None => Category::Other,
    };

    let new = NewTransaction {
        category: Some(category.to_string()),
        currency: Some(profile.preferred_currency.clone()),
        description: Some(format!(
            "Telegram: {}",
            text.chars().take(DESCRIPTION_CHARS).collect::<String>()
        )),
        source: Source::Telegram,
        ai_categorized: true,
        ..NewTransaction::manual(parsed.merchant, parsed.amount)
    };
    let created = match create_transaction(ctx.db, profile.id, new, &profile.preferred_currency).await {
        Ok(created) => created,
        Err(e) => {
            warn!(user_id = %profile.id, "Failed to save Telegram expense: {e}");
            return Ok(SAVE_FAILED.to_string());
        }
    };
    info!(user_id = %profile.id, transaction_id = %created.id, "Expense logged from Telegram");

    Ok(format!(
        "✅ Logged: {} – {} ({})",
        escape_markdown(&created.merchant),
        format_money(created.amount, &created.currency),
        created.category
    ))
}

async fn answer_question(
    ctx: WebhookContext<'_>,
    profile: &profile::Model,
    question: &str,
) -> Result<String> {
    let Some(model) = ctx.model else {
        return Ok(NO_ADVISOR.to_string());
    };

    let recent = recent_transactions(ctx.db, profile.id, ADVISOR_TRANSACTIONS).await?;
    let advisor = AdvisorContext {
        name: profile.name.clone(),
        monthly_income: profile.monthly_income,
        fixed_bills: profile.fixed_bills,
        savings_goal: profile.savings_goal,
        total_spent: recent.iter().map(|t| t.amount).sum(),
        currency: profile.preferred_currency.clone(),
        recent_transactions: recent.iter().map(format_transaction_line).collect(),
        history: Vec::new(),
    };

    Ok(ask_advisor(model, &advisor, question)
        .await
        .unwrap_or_else(|e| {
            warn!("Advisor request failed: {e}");
            NO_ADVISOR.to_string()
        }))
}

/// Works out the reply to one text message.
///
/// Returns `None` when nothing should be sent.
#[instrument(skip(ctx, sender, text), fields(chat_id = sender.chat_id))]
pub async fn handle_text(
    ctx: WebhookContext<'_>,
    sender: &Sender,
    text: &str,
) -> Result<Option<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(command) = text.strip_prefix('/') {
        let mut parts = command.split_whitespace();
        // `/start@sentinel_bot` in group chats
        let name = parts
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let reply = match name.as_str() {
            "start" => {
                let link =
                    create_pending_link(ctx.db, sender.chat_id, sender.username.clone()).await?;
                info!("Link code issued");
                welcome_text(
                    link.verification_code.as_deref().unwrap_or_default(),
                    sender.first_name.as_deref(),
                    ctx.bot_username,
                )
            }
            "help" => HELP_TEXT.to_string(),
            "link" => match parts.next() {
                Some(code) => code_reply(ctx, code).await?,
                None => "Usage: /link <code>".to_string(),
            },
            _ => "Unknown command. Send /help to see what I can do.".to_string(),
        };
        return Ok(Some(reply));
    }

    if looks_like_code(text) {
        return code_reply(ctx, text).await.map(Some);
    }

    let profile = find_by_telegram_chat(ctx.db, sender.chat_id).await?;

    if let Some(parsed) = parse_expense(text) {
        return match profile {
            Some(profile) => log_expense(ctx, &profile, parsed, text).await.map(Some),
            None => Ok(Some(NOT_LINKED.to_string())),
        };
    }

    match profile {
        Some(profile) => answer_question(ctx, &profile, text).await.map(Some),
        None => Ok(Some(
            "Link your account first to ask questions. Send /start to get a link code.".to_string(),
        )),
    }
}

/// Handles one webhook update and sends the reply, if any.
///
/// Updates without a text message (edits, photos, callbacks) are ignored.
/// A failed send is logged, not
/// returned, so Telegram does not redeliver the update.
pub async fn handle_update(ctx: WebhookContext<'_>, update: &Update) -> Result<()> {
    let Some(message) = update.message.as_ref() else {
        return Ok(());
    };
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };

    let sender = Sender {
        chat_id: message.chat.id,
        username: message.username(),
        first_name: message.first_name().map(ToString::to_string),
    };

    let Some(reply) = handle_text(ctx, &sender, text).await? else {
        return Ok(());
    };

    match ctx.bot {
        Some(bot) => {
            if let Err(e) = bot.send_message(sender.chat_id, &reply).await {
                warn!(chat_id = sender.chat_id, "Failed to send reply: {e}");
            }
        }
        None => warn!("Reply dropped: no bot token configured"),
    }
    Ok(())
}
