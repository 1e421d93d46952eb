//! USSD turn executor

use super::traits::{Storage, Summarizer, Translator};
use super::{RuntimeError, TurnRequest};

use crate::services::ServiceError;
use crate::state_machine::event::split_input;
use crate::state_machine::{menus, transition, Effect, Event, Language, Screen, Step};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Language under which summaries are cached
const SUMMARY_LANGUAGE: &str = "en";

/// Upper bound on transition/effect round trips in one turn
const MAX_STEPS: usize = 8;

const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(5);

/// Generic turn runtime that can work with any storage and adapter implementations
pub struct UssdRuntime<S, T, M>
where
    S: Storage + 'static,
    T: Translator + 'static,
    M: Summarizer + 'static,
{
    storage: S,
    translator: Arc<T>,
    summarizer: Arc<M>,
    adapter_timeout: Duration,
}

impl<S, T, M> UssdRuntime<S, T, M>
where
    S: Storage + 'static,
    T: Translator + 'static,
    M: Summarizer + 'static,
{
    pub fn new(storage: S, translator: T, summarizer: M) -> Self {
        Self {
            storage,
            translator: Arc::new(translator),
            summarizer: Arc::new(summarizer),
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    /// Bound each adapter call; a call that overruns is treated as a failure
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Process one inbound hop and return the screen to send back.
    ///
    /// The session row is written at most once, after the screen is known.
    /// Replays and final screens leave it untouched.
    pub async fn handle_turn(&self, request: &TurnRequest) -> Result<Screen, RuntimeError> {
        let start = Instant::now();
        let mut session = self
            .storage
            .get_or_create(&request.session_id, &request.phone_number)
            .await
            .map_err(RuntimeError::Store)?;

        let tokens = split_input(&request.text);
        let depth = tokens.len();
        let mut state = session.state.clone();
        let mut event = Event::Input {
            tokens,
            consumed: session.input_depth,
        };

        let mut steps = 0;
        let screen = loop {
            steps += 1;
            if steps > MAX_STEPS {
                return Err(RuntimeError::Unsettled(MAX_STEPS));
            }

            let result = transition(&state, event)?;
            state = result.new_state;

            match result.step {
                Step::Respond(screen) => break screen,
                Step::Repeat => {
                    let screen = session
                        .last_response
                        .as_deref()
                        .and_then(Screen::parse)
                        .unwrap_or_else(|| menus::default_prompt(&session.state));
                    tracing::debug!(
                        session_id = %request.session_id,
                        menu_level = %state.menu_level(),
                        tokens = depth,
                        "Replaying previous screen"
                    );
                    return Ok(screen);
                }
                Step::Run(effect) => {
                    tracing::debug!(
                        session_id = %request.session_id,
                        effect = effect.kind(),
                        "Executing effect"
                    );
                    event = self.execute_effect(effect).await?;
                }
            }
        };

        if !screen.is_final() {
            session.state = state;
            session.input_depth = depth;
            session.last_response = Some(screen.to_string());
            self.storage
                .save(&session)
                .await
                .map_err(RuntimeError::Store)?;
        }

        tracing::info!(
            session_id = %request.session_id,
            menu_level = %session.state.menu_level(),
            tokens = depth,
            final_screen = screen.is_final(),
            duration_ms = %start.elapsed().as_millis(),
            "USSD turn handled"
        );

        Ok(screen)
    }

    async fn execute_effect(&self, effect: Effect) -> Result<Event, RuntimeError> {
        match effect {
            Effect::ListResources {
                filter,
                limit,
                then,
            } => {
                let resources = self
                    .storage
                    .list_approved(&filter, limit)
                    .await
                    .map_err(RuntimeError::Store)?;
                Ok(Event::ResourcesListed { then, resources })
            }

            Effect::LoadResource { resource_id, then } => {
                let resource = self
                    .storage
                    .get_resource(resource_id)
                    .await
                    .map_err(RuntimeError::Store)?;
                if resource.is_none() {
                    tracing::info!(resource_id, "Selected resource is gone or unapproved");
                }
                Ok(Event::ResourceLoaded { then, resource })
            }

            Effect::Summarize { resource_id, text } => {
                let result = self.summarize(resource_id, &text).await;
                Ok(Event::SummaryReady {
                    source: text,
                    result,
                })
            }

            Effect::Translate {
                resource_id,
                text,
                language,
            } => {
                let result = self.translate(resource_id, &text, language).await;
                Ok(Event::TranslationReady {
                    original: text,
                    result,
                })
            }
        }
    }

    /// Summarize through the cache; cache failures are logged and skipped.
    /// Placeholder output is returned without being stored.
    async fn summarize(&self, resource_id: i64, text: &str) -> Result<String, ServiceError> {
        match self
            .storage
            .cached_summary(resource_id, SUMMARY_LANGUAGE)
            .await
        {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(resource_id, error = %e, "Summary cache read failed"),
        }

        let summary = self.bounded(self.summarizer.summarize(text)).await?;
        if self.summarizer.is_placeholder() {
            return Ok(summary);
        }

        if let Err(e) = self
            .storage
            .store_summary(resource_id, SUMMARY_LANGUAGE, &summary)
            .await
        {
            tracing::warn!(resource_id, error = %e, "Summary cache write failed");
        }
        Ok(summary)
    }

    async fn translate(
        &self,
        resource_id: i64,
        text: &str,
        language: Language,
    ) -> Result<String, ServiceError> {
        match self
            .storage
            .cached_translation(resource_id, language.code())
            .await
        {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(resource_id, error = %e, "Translation cache read failed"),
        }

        let translated = self
            .bounded(self.translator.translate(text, language))
            .await?;
        if self.translator.is_placeholder() {
            return Ok(translated);
        }

        if let Err(e) = self
            .storage
            .store_translation(resource_id, language.code(), &translated)
            .await
        {
            tracing::warn!(resource_id, error = %e, "Translation cache write failed");
        }
        Ok(translated)
    }

    async fn bounded<F>(&self, call: F) -> Result<String, ServiceError>
    where
        F: Future<Output = Result<String, ServiceError>>,
    {
        match tokio::time::timeout(self.adapter_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::timeout(format!(
                "No answer within {}ms",
                self.adapter_timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewResource};
    use crate::runtime::testing::{
        FailingStore, MockSummarizer, MockTranslator, SlowSummarizer,
    };
    use crate::runtime::DatabaseStorage;
    use crate::services::{LocalSummarizer, LocalTranslator};
    use crate::state_machine::{DialogueState, Grade, MenuLevel, Subject};

    type TestRuntime<T, M> = UssdRuntime<DatabaseStorage, T, M>;

    const MAIN_MENU: &str =
        "CON Welcome to African LMS:\n1. Browse Subjects\n2. Search Resources\n3. My Account\n0. Exit";

    fn local_runtime(db: &Database) -> TestRuntime<LocalTranslator, LocalSummarizer> {
        UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            LocalTranslator,
            LocalSummarizer,
        )
    }

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_resource(
            &NewResource::new("Mathematics Basics", "Mathematics", "Primary")
                .with_description("Counting and number sense. Adding small numbers. Shapes around us. Measuring length."),
        )
        .unwrap();
        db
    }

    fn turn(session_id: &str, text: &str) -> TurnRequest {
        TurnRequest {
            phone_number: "+254700000001".to_string(),
            session_id: session_id.to_string(),
            text: text.to_string(),
        }
    }

    /// Drive a session through a sequence of cumulative inputs
    async fn walk<S, T, M>(runtime: &UssdRuntime<S, T, M>, session_id: &str, inputs: &[&str]) -> String
    where
        S: Storage + 'static,
        T: Translator + 'static,
        M: Summarizer + 'static,
    {
        let mut last = String::new();
        for text in inputs {
            last = runtime
                .handle_turn(&turn(session_id, text))
                .await
                .unwrap()
                .to_string();
        }
        last
    }

    #[tokio::test]
    async fn test_first_turn_shows_main_menu() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let screen = runtime.handle_turn(&turn("s1", "")).await.unwrap();
        assert_eq!(screen.to_string(), MAIN_MENU);

        let session = db.get_session("s1").unwrap();
        assert_eq!(session.state, DialogueState::Main);
        assert_eq!(session.input_depth, 0);
    }

    #[tokio::test]
    async fn test_browse_subjects() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["", "1"]).await;
        assert_eq!(
            out,
            "CON Select Subject:\n1. Mathematics\n2. Science\n3. Languages\n4. History\n5. Geography\n0. Back"
        );
        let session = db.get_session("s1").unwrap();
        assert_eq!(session.state.menu_level(), MenuLevel::BrowseSubjects);
        assert_eq!(session.input_depth, 1);
    }

    #[tokio::test]
    async fn test_drill_down_to_resource_options() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let listing = walk(&runtime, "s1", &["1", "1*1", "1*1*1"]).await;
        assert_eq!(listing, "CON Select Resource:\n1. Mathematics Basics\n0. Back");

        let out = walk(&runtime, "s1", &["1*1*1*1"]).await;
        assert_eq!(
            out,
            "CON Mathematics Basics:\n1. View Summary\n2. Get SMS Link\n3. Translate\n0. Back"
        );

        let session = db.get_session("s1").unwrap();
        assert_eq!(session.state.menu_level(), MenuLevel::ResourceOptions);
        assert_eq!(session.state.selected_subject(), Some(Subject::Mathematics));
        assert_eq!(session.state.selected_grade(), Some(Grade::Primary));
        assert!(session.state.selected_resource_id().is_some());
        assert_eq!(session.input_depth, 4);
    }

    #[tokio::test]
    async fn test_summary_of_resource_without_description_uses_title() {
        let db = Database::open_in_memory().unwrap();
        db.insert_resource(&NewResource::new("Cells", "Science", "Secondary"))
            .unwrap();
        let summarizer = Arc::new(MockSummarizer::failing());
        let runtime = UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            LocalTranslator,
            summarizer.clone(),
        );

        let out = walk(&runtime, "s1", &["1", "1*2", "1*2*2", "1*2*2*1", "1*2*2*1*1"]).await;
        assert_eq!(out, "END Summary: Cells");
        assert_eq!(summarizer.recorded_inputs(), vec!["Cells".to_string()]);
    }

    #[tokio::test]
    async fn test_summary_uses_description_and_is_cached() {
        let db = seeded_db();
        let summarizer = Arc::new(MockSummarizer::returning("Short summary"));
        let runtime = UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            LocalTranslator,
            summarizer.clone(),
        );

        let out = walk(&runtime, "s1", &["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*1"]).await;
        assert_eq!(out, "END Summary: Short summary");

        let out = walk(&runtime, "s2", &["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*1"]).await;
        assert_eq!(out, "END Summary: Short summary");

        // Second session is served from the cache
        let inputs = summarizer.recorded_inputs();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0].starts_with("Counting and number sense."));
    }

    #[tokio::test]
    async fn test_empty_grade_listing() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["1", "1*4", "1*4*3"]).await;
        assert_eq!(out, "CON No resources found for this criteria.\n0. Back");
        let session = db.get_session("s1").unwrap();
        assert_eq!(
            session.state,
            DialogueState::BrowseResources {
                subject: Subject::History,
                grade: Grade::University,
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_main_choice() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["9"]).await;
        assert_eq!(
            out,
            "CON Invalid choice. Try again:\n1. Browse Subjects\n2. Search Resources\n3. My Account\n0. Exit"
        );
        assert_eq!(db.get_session("s1").unwrap().state, DialogueState::Main);
    }

    #[tokio::test]
    async fn test_duplicate_hop_replays_byte_for_byte() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let first = walk(&runtime, "s1", &["1", "1*1"]).await;
        let before = db.get_session("s1").unwrap();

        let replay = walk(&runtime, "s1", &["1*1"]).await;
        assert_eq!(replay, first);

        // A shorter sequence is also a replay
        let replay = walk(&runtime, "s1", &["1"]).await;
        assert_eq!(replay, first);

        let after = db.get_session("s1").unwrap();
        assert_eq!(after.state, before.state);
        assert_eq!(after.input_depth, before.input_depth);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_back_navigation_clears_owned_fields() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        walk(&runtime, "s1", &["1", "1*1", "1*1*1", "1*1*1*1"]).await;

        let out = walk(&runtime, "s1", &["1*1*1*1*0"]).await;
        assert_eq!(out, "CON Select Resource:\n1. Mathematics Basics\n0. Back");
        let session = db.get_session("s1").unwrap();
        assert_eq!(session.state.selected_resource_id(), None);
        assert_eq!(session.state.selected_grade(), Some(Grade::Primary));

        walk(&runtime, "s1", &["1*1*1*1*0*0"]).await;
        let session = db.get_session("s1").unwrap();
        assert_eq!(
            session.state,
            DialogueState::SelectGrade {
                subject: Subject::Mathematics
            }
        );
    }

    #[tokio::test]
    async fn test_resource_unapproved_between_turns() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        walk(&runtime, "s1", &["1", "1*1", "1*1*1", "1*1*1*1"]).await;
        let id = db.get_session("s1").unwrap().state.selected_resource_id().unwrap();
        db.set_approved(id, false).unwrap();

        let out = walk(&runtime, "s1", &["1*1*1*1*2"]).await;
        assert_eq!(out, "END Resource not found.");
    }

    #[tokio::test]
    async fn test_sms_link_is_final() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*2"]).await;
        assert_eq!(out, "END SMS with resource link will be sent shortly.");

        // Final turns are not persisted
        let session = db.get_session("s1").unwrap();
        assert_eq!(session.state.menu_level(), MenuLevel::ResourceOptions);
        assert_eq!(session.input_depth, 4);
    }

    #[tokio::test]
    async fn test_translation_success_and_cache_hit() {
        let db = seeded_db();
        let translator = Arc::new(MockTranslator::echo());
        let runtime = UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            translator.clone(),
            LocalSummarizer,
        );

        let path = ["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*3"];
        let menu = walk(&runtime, "s1", &path).await;
        assert!(menu.starts_with("CON Select Language:"));

        let out = walk(&runtime, "s1", &["1*1*1*1*3*1"]).await;
        assert_eq!(out, "END Translated title: sw:Mathematics Basics");

        walk(&runtime, "s2", &path).await;
        let out = walk(&runtime, "s2", &["1*1*1*1*3*1"]).await;
        assert_eq!(out, "END Translated title: sw:Mathematics Basics");

        assert_eq!(translator.call_count(), 1);
        let id = db.get_session("s1").unwrap().state.selected_resource_id().unwrap();
        let cached = db.list_translations(id).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].language, "sw");
    }

    #[tokio::test]
    async fn test_translation_failure_is_fail_soft() {
        let db = seeded_db();
        let runtime = UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            MockTranslator::failing(),
            LocalSummarizer,
        );

        let out = walk(
            &runtime,
            "s1",
            &["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*3", "1*1*1*1*3*4"],
        )
        .await;
        assert_eq!(
            out,
            "END Translation unavailable. Original title: Mathematics Basics"
        );
        let id = db.get_session("s1").unwrap().state.selected_resource_id().unwrap();
        assert!(db.list_translations(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_summarizer_times_out_to_source_text() {
        let db = Database::open_in_memory().unwrap();
        db.insert_resource(&NewResource::new("Rivers", "Geography", "Primary"))
            .unwrap();
        let runtime = UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            LocalTranslator,
            SlowSummarizer::new(Duration::from_secs(30)),
        )
        .with_adapter_timeout(Duration::from_millis(20));

        let out = walk(&runtime, "s1", &["1", "1*5", "1*5*1", "1*5*1*1", "1*5*1*1*1"]).await;
        assert_eq!(out, "END Summary: Rivers");
    }

    #[tokio::test]
    async fn test_search_and_placeholders() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["2", "2*basics"]).await;
        assert_eq!(
            out,
            "CON Search Results:\n1. Mathematics Basics (Mathematics)\n0. Back"
        );
        let out = walk(&runtime, "s1", &["2*basics*1"]).await;
        assert_eq!(
            out,
            "CON Search results functionality would be implemented here.\n0. Back"
        );
        let out = walk(&runtime, "s1", &["2*basics*1*0"]).await;
        assert_eq!(out, MAIN_MENU);

        let out = walk(&runtime, "s2", &["2", "2*volcanoes"]).await;
        assert_eq!(out, "CON No resources found.\n0. Back");
        assert_eq!(db.get_session("s2").unwrap().state, DialogueState::Main);
    }

    #[tokio::test]
    async fn test_account_menu() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["3"]).await;
        assert_eq!(out, "CON Account Options:\n1. Register\n2. Login\n0. Back");
        let out = walk(&runtime, "s1", &["3*1"]).await;
        assert_eq!(
            out,
            "CON Account management would be implemented here.\n0. Back"
        );
    }

    #[tokio::test]
    async fn test_exit_is_final() {
        let db = seeded_db();
        let runtime = local_runtime(&db);
        let out = walk(&runtime, "s1", &["0"]).await;
        assert_eq!(out, "END Thank you for using African LMS");
    }

    #[tokio::test]
    async fn test_save_failure_is_fatal() {
        let db = seeded_db();
        let runtime = UssdRuntime::new(
            FailingStore::failing_saves(DatabaseStorage::new(db.clone())),
            LocalTranslator,
            LocalSummarizer,
        );

        let err = runtime.handle_turn(&turn("s1", "1")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Store(_)));
        // Nothing was persisted past creation
        let session = db.get_session("s1").unwrap();
        assert_eq!(session.state, DialogueState::Main);
        assert_eq!(session.input_depth, 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_mid_turn_is_fatal() {
        let db = seeded_db();
        let runtime = UssdRuntime::new(
            FailingStore::failing_listings(DatabaseStorage::new(db.clone())),
            LocalTranslator,
            LocalSummarizer,
        );

        walk(&runtime, "s1", &["1", "1*1"]).await;
        let err = runtime.handle_turn(&turn("s1", "1*1*1")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Store(_)));

        // The grade pick was not recorded
        let session = db.get_session("s1").unwrap();
        assert_eq!(
            session.state,
            DialogueState::SelectGrade {
                subject: Subject::Mathematics
            }
        );
        assert_eq!(session.input_depth, 2);
        assert!(session
            .last_response
            .as_deref()
            .unwrap()
            .starts_with("CON Select Grade Level:"));
    }

    #[tokio::test]
    async fn test_reset_session_prompts_main_not_stale_screen() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["1", "1*1"]).await;
        assert!(out.starts_with("CON Select Grade Level:"));

        db.execute_batch("UPDATE ussd_sessions SET selected_subject = NULL WHERE session_id = 's1'")
            .unwrap();

        // Same hop again: nothing new to act on, so the main menu is shown
        let out = walk(&runtime, "s1", &["1*1"]).await;
        assert_eq!(out, MAIN_MENU);

        // The next key is read as a main menu choice
        let out = walk(&runtime, "s1", &["1*1*1"]).await;
        assert!(out.starts_with("CON Select Subject:"));
        assert_eq!(db.get_session("s1").unwrap().state, DialogueState::BrowseSubjects);
    }

    #[tokio::test]
    async fn test_signed_key_is_invalid_on_subject_menu() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(&runtime, "s1", &["1", "1*+1"]).await;
        assert!(out.starts_with("CON Invalid choice."));
        assert_eq!(db.get_session("s1").unwrap().state, DialogueState::BrowseSubjects);
    }

    #[tokio::test]
    async fn test_local_adapter_output_is_not_cached() {
        let db = seeded_db();
        let runtime = local_runtime(&db);

        let out = walk(
            &runtime,
            "s1",
            &["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*3", "1*1*1*1*3*1"],
        )
        .await;
        assert_eq!(out, "END Translated title: [Kiswahili] Mathematics Basics");
        let out = walk(&runtime, "s2", &["1", "1*1", "1*1*1", "1*1*1*1", "1*1*1*1*1"]).await;
        assert!(out.starts_with("END Summary: Counting and number sense."));

        let id = db.list_approved(&Default::default(), 0, 1).unwrap()[0].id;
        assert!(db.list_translations(id).unwrap().is_empty());
        assert!(db.get_summary(id, "en").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_failure_is_fatal() {
        let db = seeded_db();
        let runtime = UssdRuntime::new(
            FailingStore::failing_loads(DatabaseStorage::new(db)),
            LocalTranslator,
            LocalSummarizer,
        );
        let err = runtime.handle_turn(&turn("s1", "")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Store(_)));
    }
}
