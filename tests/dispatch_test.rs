//! End-to-end dispatch tests
//! Run with: cargo test --test dispatch_test

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};

use carik_commands::application::messaging::RateLimitConfig;
use carik_commands::application::services::CommandService;
use carik_commands::domain::traits::{Clock, PREFIX_KEY};
use carik_commands::infrastructure::storage::MemoryStore;
use carik_commands::{
    BotError, Command, CommandRegistry, Conversation, Dispatcher, Message, Outcome, Sender,
    Storage, User, Value,
};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Records plain-text replies
struct Recorder {
    id: &'static str,
    replies: Mutex<Vec<String>>,
}

impl Recorder {
    fn new(id: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            replies: Mutex::new(Vec::new()),
        })
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.replies.lock().unwrap())
    }
}

impl Sender for Recorder {
    fn id(&self) -> &str {
        self.id
    }

    fn send_message(&self, _conversation: &Conversation, message: &Message) -> Result<(), BotError> {
        self.replies.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Manually advanced clock
#[derive(Default)]
struct ManualClock(AtomicI64);

impl ManualClock {
    fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

struct Harness {
    dispatcher: Dispatcher,
    chat: Arc<Recorder>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn with_commands(commands: Vec<Command>) -> Self {
        ensure_init();
        let chat = Recorder::new("chat");
        let mut registry = CommandRegistry::new();
        for cmd in commands {
            registry.register(cmd).unwrap();
        }
        registry.add_sender(chat.clone());

        let store = MemoryStore::new();
        store.set_default_guild_value(PREFIX_KEY, Value::from("!")).unwrap();

        let clock = Arc::new(ManualClock::default());
        clock.set(1_700_000_000);
        let dispatcher =
            Dispatcher::new(Arc::new(registry), Arc::new(store)).with_clock(clock.clone());
        Self {
            dispatcher,
            chat,
            clock,
        }
    }

    fn builtins() -> Self {
        let chat = Recorder::new("chat");
        let mut service = CommandService::new();
        service.register_defaults().unwrap();
        service.add_sender(chat.clone());

        let store = MemoryStore::new();
        store.set_default_guild_value(PREFIX_KEY, Value::from("!")).unwrap();
        let clock = Arc::new(ManualClock::default());
        let dispatcher = Dispatcher::new(Arc::new(service.into_registry()), Arc::new(store))
            .with_clock(clock.clone());
        ensure_init();
        Self {
            dispatcher,
            chat,
            clock,
        }
    }

    fn send(&self, conversation: &Conversation, user: &User, text: &str) -> Outcome {
        self.dispatcher.on_message(conversation, user, text).unwrap()
    }
}

fn limited_repeat(config: RateLimitConfig) -> Command {
    Command::new("repeat ")
        .with_parameters(&["string"])
        .with_rate_limit(config.with_message("Slow down"))
        .with_handler(|ctx| {
            ctx.reply_text(ctx.args.text(0).unwrap_or_default());
            Ok(())
        })
}

fn guild_chat() -> Conversation {
    Conversation::new("chat", "general", "g1")
}

#[test]
fn test_per_user_rate_limit() {
    let h = Harness::with_commands(vec![limited_repeat(RateLimitConfig::per_user("repeat", 1, 60))]);
    let u = User::new("chat", "U");
    let v = User::new("chat", "V");

    assert_eq!(h.send(&guild_chat(), &u, "!repeat one"), Outcome::Delivered);
    h.clock.set(1_700_000_030);
    assert_eq!(h.send(&guild_chat(), &u, "!repeat two"), Outcome::Rejected);
    assert_eq!(h.send(&guild_chat(), &v, "!repeat three"), Outcome::Delivered);

    assert_eq!(h.chat.take(), vec!["one", "Slow down", "three"]);
}

#[test]
fn test_global_rate_limit() {
    let h = Harness::with_commands(vec![limited_repeat(RateLimitConfig::global("repeat", 1, 60))]);
    let u = User::new("chat", "U");
    let v = User::new("chat", "V");

    assert_eq!(h.send(&guild_chat(), &u, "!repeat one"), Outcome::Delivered);
    h.clock.set(1_700_000_010);
    assert_eq!(h.send(&guild_chat(), &v, "!repeat two"), Outcome::Rejected);

    assert_eq!(h.chat.take(), vec!["one", "Slow down"]);
}

#[test]
fn test_rate_limit_window_expires() {
    let h = Harness::with_commands(vec![limited_repeat(RateLimitConfig::per_user("repeat", 2, 60))]);
    let u = User::new("chat", "U");

    assert_eq!(h.send(&guild_chat(), &u, "!repeat a"), Outcome::Delivered);
    assert_eq!(h.send(&guild_chat(), &u, "!repeat b"), Outcome::Delivered);
    assert_eq!(h.send(&guild_chat(), &u, "!repeat c"), Outcome::Rejected);

    h.clock.set(1_700_000_000 + 60);
    assert_eq!(h.send(&guild_chat(), &u, "!repeat d"), Outcome::Delivered);
}

#[test]
fn test_disabled_rate_limit_is_noop() {
    let h = Harness::with_commands(vec![limited_repeat(RateLimitConfig::per_user("repeat", 0, 60))]);
    let u = User::new("chat", "U");
    for _ in 0..5 {
        assert_eq!(h.send(&guild_chat(), &u, "!repeat x"), Outcome::Delivered);
    }
    assert!(h.dispatcher.storage().get_user_value(&u, "repeat").is_none());
}

#[test]
fn test_prefix_resolution() {
    let h = Harness::with_commands(vec![limited_repeat(RateLimitConfig::per_user("repeat", 0, 0))]);
    let u = User::new("chat", "U");

    assert_eq!(h.send(&guild_chat(), &u, "!repeat hello"), Outcome::Delivered);
    assert_eq!(h.send(&guild_chat(), &u, "repeathello"), Outcome::Dropped);
    assert_eq!(h.send(&guild_chat(), &u, "!repeathello"), Outcome::Dropped);
    assert_eq!(h.chat.take(), vec!["hello"]);
}

#[test]
fn test_admin_lifecycle_through_builtins() {
    let h = Harness::builtins();
    let boss = User::new("chat", "boss");
    let admin_chat = guild_chat().with_admin(true);
    let plain_chat = guild_chat();
    let guild = guild_chat().guild();

    h.send(&admin_chat, &boss, "!admin u2");
    h.send(&admin_chat, &boss, "!admin u1");
    h.send(&admin_chat, &boss, "!admin u1");
    let storage = h.dispatcher.storage();
    assert!(storage.is_admin(&guild, "u1").unwrap());
    assert!(storage.is_admin(&guild, "u2").unwrap());

    h.send(&plain_chat, &boss, "!unadmin u1");
    assert!(storage.is_admin(&guild, "u1").unwrap());

    h.send(&admin_chat, &boss, "!unadmin u1");
    assert!(!storage.is_admin(&guild, "u1").unwrap());
    assert!(storage.is_admin(&guild, "u2").unwrap());

    assert_eq!(
        h.chat.take(),
        vec![
            "u2 is now an admin",
            "u1 is now an admin",
            "u1 is already an admin",
            "You are not authorized to use this command.",
            "u1 is no longer an admin",
        ]
    );
}

#[test]
fn test_prefix_command_is_per_guild() {
    let h = Harness::builtins();
    let boss = User::new("chat", "boss");
    let g1 = guild_chat().with_admin(true);
    let g2 = Conversation::new("chat", "lobby", "g2");

    assert_eq!(h.send(&g1, &boss, "!prefix >>"), Outcome::Delivered);
    assert_eq!(h.send(&g1, &boss, ">>repeat hi"), Outcome::Delivered);
    assert_eq!(h.send(&g2, &boss, ">>repeat hi"), Outcome::Dropped);
    assert_eq!(h.send(&g2, &boss, "!repeat yo"), Outcome::Delivered);
    assert_eq!(h.chat.take(), vec!["Prefix set to `>>`", "hi", "yo"]);
}

#[test]
fn test_help_lists_commands() {
    let h = Harness::builtins();
    let u = User::new("chat", "U");
    assert_eq!(h.send(&guild_chat(), &u, "!help"), Outcome::Delivered);

    let replies = h.chat.take();
    assert_eq!(replies.len(), 1);
    let help = &replies[0];
    assert!(help.starts_with("Available commands"));
    assert!(help.contains("!repeat <string>: Repeat the given text"));
    assert!(help.contains("!admin <string>: Grant admin rights on this server (admin)"));
}

#[test]
fn test_builtin_repeat_default_limit() {
    let h = Harness::builtins();
    let u = User::new("chat", "U");
    for _ in 0..5 {
        assert_eq!(h.send(&guild_chat(), &u, "!repeat hey"), Outcome::Delivered);
    }
    assert_eq!(h.send(&guild_chat(), &u, "!repeat hey"), Outcome::Rejected);
    h.clock.set(h.clock.now() + 60);
    assert_eq!(h.send(&guild_chat(), &u, "!repeat hey"), Outcome::Delivered);
}

#[test]
fn test_reply_not_sent_to_other_services() {
    let h = Harness::builtins();
    let slack = Conversation::new("slack", "general", "g1");
    let u = User::new("slack", "U");
    assert_eq!(h.send(&slack, &u, "!repeat hi"), Outcome::Delivered);
    assert!(h.chat.take().is_empty());
}

#[test]
fn test_concurrent_admin_grants_are_all_kept() {
    let h = Harness::builtins();
    let boss = User::new("chat", "boss");
    let admin_chat = guild_chat().with_admin(true);
    let ids: Vec<String> = (0..16).map(|i| format!("u{}", i)).collect();

    std::thread::scope(|s| {
        for id in &ids {
            let (h, boss, admin_chat) = (&h, &boss, &admin_chat);
            s.spawn(move || {
                assert_eq!(
                    h.send(admin_chat, boss, &format!("!admin {}", id)),
                    Outcome::Delivered
                );
            });
        }
    });

    let guild = guild_chat().guild();
    let storage = h.dispatcher.storage();
    for id in &ids {
        assert!(storage.is_admin(&guild, id).unwrap(), "lost grant for {}", id);
    }
    assert_eq!(h.chat.take().len(), ids.len());
}
