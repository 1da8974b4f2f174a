use std::sync::Arc;

use clap::{Parser, Subcommand};
use mingle::deck::filter_by_interests;
use mingle::models::ParticipationState;
use mingle::store::PgStore;
use mingle::utils::logging::init_logging;
use mingle::{Config, Mingle, Session, Uuid};

#[derive(Parser)]
#[command(name = "mingle", about = "Swipe-to-match activity client")]
struct Cli {
    /// Act as this user id. Reads run signed out without it; mutations fail.
    #[arg(long, global = true)]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Show the swipe feed of not-yet-voted activities.
    Feed {
        /// Keep only activities tagged with one of your interests.
        #[arg(long)]
        filtered: bool,
    },
    /// Vote on an activity (like by default).
    Swipe {
        activity: Uuid,
        #[arg(long)]
        dislike: bool,
    },
    /// List your liked activities.
    Saved,
    /// Confirm your participation in a quorum-reached activity.
    Confirm { activity: Uuid },
    /// Show where an activity sits in the like/quorum/room pipeline.
    Status { activity: Uuid },
    /// List your accepted friends.
    Friends,
    /// List pending friend requests addressed to you.
    Requests,
    /// Send a friend request.
    SendRequest { to: Uuid },
    /// Accept a pending friend request by its relationship id.
    Accept { friendship: Uuid },
    /// List your chat rooms with their latest messages.
    Chats,
    /// Open (find or create) the 1:1 room with a friend.
    DirectChat { friend: Uuid },
    /// Send a message into a room.
    Send { room: Uuid, message: String },
    /// Show the merged updates feed.
    Updates,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = Arc::new(PgStore::connect(&config).await?);

    if matches!(cli.command, Command::Migrate) {
        store.run_migrations().await?;
        tracing::info!("migrations applied");
        return Ok(());
    }

    let session = match cli.user {
        Some(user) => Session::signed_in(user),
        None => Session::new(),
    };
    let app = Mingle::new(store, session);

    match cli.command {
        Command::Migrate => unreachable!(),
        Command::Feed { filtered } => {
            let mut feed = app.activities().feed().await?;
            if filtered {
                let interests = app.interests().my_interest_ids().await?;
                feed = filter_by_interests(&feed, &interests, true);
            }
            for activity in feed {
                println!("{}  {}  {}", activity.id, activity.activity_date, activity.name);
            }
        }
        Command::Swipe { activity, dislike } => {
            app.activities().record_swipe(activity, !dislike).await?;
            println!("recorded {}", if dislike { "dislike" } else { "like" });
        }
        Command::Saved => {
            for activity in app.activities().saved().await? {
                println!("{}  {}  {}", activity.id, activity.activity_date, activity.name);
            }
        }
        Command::Confirm { activity } => {
            app.activities().confirm_participation(activity).await?;
            println!("{:?}", app.activities().participation_state(activity).await?);
        }
        Command::Status { activity } => {
            let state = app.activities().participation_state(activity).await?;
            let count = app.activities().participant_count(activity).await?;
            match state {
                ParticipationState::Open => println!("open ({count} in so far)"),
                ParticipationState::QuorumReached => println!("quorum reached ({count} in)"),
                ParticipationState::ConfirmedRoomCreated => println!("happening, chat room open"),
            }
        }
        Command::Friends => {
            for friend in app.refresh_friends().await? {
                println!("{}  {}", friend.id, friend.display_name());
            }
        }
        Command::Requests => {
            for request in app.friends().pending_requests().await? {
                let sender = request
                    .sender
                    .as_ref()
                    .map(|p| p.display_name().to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                println!("{}  from {}", request.friendship.id, sender);
            }
        }
        Command::SendRequest { to } => {
            app.friends().send_request(to).await?;
            println!("request sent");
        }
        Command::Accept { friendship } => {
            app.friends().accept_request(friendship).await?;
            println!("accepted");
        }
        Command::Chats => {
            for preview in app.refresh_chats().await? {
                let last = preview.last_message.as_deref().unwrap_or("(no messages)");
                println!("{}  {}  {}", preview.room_id, preview.name, last);
            }
        }
        Command::DirectChat { friend } => {
            let room = app.chats().start_direct_chat(friend).await?;
            println!("{room}");
        }
        Command::Send { room, message } => {
            app.chats().send_message(room, &message).await?;
            app.chats().mark_room_read(room).await?;
        }
        Command::Updates => {
            for item in app.refresh_updates().await? {
                println!("{}  {}", item.timestamp, item.message);
            }
        }
    }

    Ok(())
}
