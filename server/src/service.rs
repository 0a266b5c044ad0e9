use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tripwire_core::SafeStartPlacement;
use tripwire_protocol::*;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::error::{Result, SessionError};
use crate::idempotency::{IdempotencyCache, StoredResponse};
use crate::session::GameId;
use crate::store::{MemoryBackend, SessionBackend, SessionStore};

/// Entry point for client requests.
///
/// Validates input, keeps create idempotent and turns every outcome into a [`Response`].
pub struct GameService<B = MemoryBackend> {
    store: SessionStore<B>,
    idempotency: Arc<IdempotencyCache>,
    limits: Limits,
}

impl GameService<MemoryBackend> {
    pub fn from_config(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Placing mines with seed {seed}");
        let placement =
            SafeStartPlacement::seeded(seed).with_attempts(config.placement_attempts);
        let store = SessionStore::in_memory(Box::new(placement), Arc::clone(&clock));
        let idempotency = Arc::new(IdempotencyCache::new(config.idempotency_ttl(), clock));
        Self::new(store, idempotency, config.limits)
    }
}

impl<B: SessionBackend> GameService<B> {
    pub fn new(store: SessionStore<B>, idempotency: Arc<IdempotencyCache>, limits: Limits) -> Self {
        Self {
            store,
            idempotency,
            limits,
        }
    }

    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    pub fn idempotency(&self) -> &Arc<IdempotencyCache> {
        &self.idempotency
    }

    pub fn shutdown(&self) {
        self.store.shutdown();
    }

    fn check_limits(&self, request: &CreateRequest) -> Result<()> {
        let board = request.board();
        let limits = &self.limits;
        if !limits.rows.contains(&board.rows) || !limits.cols.contains(&board.cols) {
            return Err(SessionError::invalid(format!(
                "Rows and cols must be between {} and {}",
                limits.rows.min, limits.rows.max
            )));
        }
        if !limits.mines.contains(&board.mines) {
            return Err(SessionError::invalid(format!(
                "Mines must be between {} and {}",
                limits.mines.min, limits.mines.max
            )));
        }
        if board.mines >= board.total_cells() {
            return Err(SessionError::invalid("Mines must be fewer than cells"));
        }
        if !limits.lives.contains(&request.lives()) {
            return Err(SessionError::invalid(format!(
                "Lives must be between {} and {}",
                limits.lives.min, limits.lives.max
            )));
        }
        Ok(())
    }

    /// Creates a game, or replays the response first produced for `key` while it is fresh.
    pub fn create(&self, request: &CreateRequest, key: Option<&str>) -> Result<StoredResponse> {
        if let Some(stored) = self.idempotency.get(key) {
            log::debug!("Replaying create for idempotency key {key:?}");
            return Ok(stored);
        }
        self.check_limits(request)?;
        let game = checked(self.store.create(
            request.board(),
            request.lives(),
            request.quick_flag(),
        )?)?;
        let location = format!("/game/{}", game.game_id);
        let body = serde_json::to_value(CreateResponse {
            game,
            preset: request.preset_label().to_owned(),
        })?;
        let response = StoredResponse {
            status: 201,
            location,
            body,
        };
        self.idempotency.set(key, response.clone());
        Ok(response)
    }

    /// Handles one request. Failures become error responses.
    pub fn handle(&self, request: Request) -> Response {
        let op = request.op();
        match self.dispatch(request) {
            Ok(response) => response,
            Err(err) => {
                if err.status_code() >= 500 {
                    log::error!("{op} failed: {err}");
                } else {
                    log::debug!("{op} rejected: {err}");
                }
                error_response(&err)
            }
        }
    }

    fn dispatch(&self, request: Request) -> Result<Response> {
        match request {
            Request::Create {
                idempotency_key,
                body,
            } => {
                let stored = self.create(&body, idempotency_key.as_deref())?;
                Ok(Response {
                    status: stored.status,
                    location: Some(stored.location),
                    body: stored.body,
                })
            }
            Request::Get { game_id } => game(self.store.get(&parse_id(&game_id)?)),
            Request::Reveal { game_id, body } => {
                game(self.store.reveal(&parse_id(&game_id)?, (body.row, body.col)))
            }
            Request::Flag { game_id, body } => game(self.store.flag(
                &parse_id(&game_id)?,
                (body.row, body.col),
                body.set,
            )),
            Request::Mode { game_id, body } => {
                ok(&self.store.set_mode(&parse_id(&game_id)?, body.quick_flag)?)
            }
            Request::Undo { game_id, body } => {
                let steps = body.steps.map_or(1, to_index);
                game(self.store.undo(&parse_id(&game_id)?, steps))
            }
            Request::Seek { game_id, body } => {
                game(self.store.seek(&parse_id(&game_id)?, to_index(body.to_index)))
            }
            Request::Preview { game_id, body } => {
                game(self.store.preview(&parse_id(&game_id)?, to_index(body.to_index)))
            }
            Request::Revive { game_id, body } => game(
                self.store
                    .revive(&parse_id(&game_id)?, body.to_index.map(to_index)),
            ),
            Request::Hint { game_id } => {
                ok(&HintResponse::from(self.store.hint(&parse_id(&game_id)?)?))
            }
            Request::Pause { game_id, body } => {
                game(self.store.pause(&parse_id(&game_id)?, body.elapsed_seconds))
            }
            Request::Resume { game_id } => game(self.store.resume(&parse_id(&game_id)?)),
            Request::Capabilities => ok(&CapabilitiesResponse::new(self.limits)),
        }
    }
}

fn parse_id(game_id: &str) -> Result<GameId> {
    game_id.parse().map_err(|_| SessionError::NotFound)
}

/// Negative indices clamp to 0.
fn to_index(index: i64) -> usize {
    if index < 0 {
        0
    } else {
        usize::try_from(index).unwrap_or(usize::MAX)
    }
}

/// Refuses to hand out a view that would leak mine positions.
fn checked(view: GameView) -> Result<GameView> {
    if view.masks_mines() {
        Ok(view)
    } else {
        log::error!(
            "Game {} view with status {:?} failed the mine mask check",
            view.game_id,
            view.status
        );
        Err(SessionError::MineLeak)
    }
}

fn game(view: Result<GameView>) -> Result<Response> {
    ok(&checked(view?)?)
}

fn ok<T: Serialize>(body: &T) -> Result<Response> {
    Ok(Response {
        status: 200,
        location: None,
        body: serde_json::to_value(body)?,
    })
}

pub fn error_response(err: &SessionError) -> Response {
    error_body(err.status_code(), err.code(), err.to_string(), None)
}

/// Response for a request line that could not be parsed at all.
pub fn malformed_request(err: &serde_json::Error) -> Response {
    error_body(
        400,
        "invalid_input",
        "Malformed request".to_owned(),
        Some(Value::String(err.to_string())),
    )
}

fn error_body(status: u16, code: &str, message: String, details: Option<Value>) -> Response {
    let body = ErrorBody {
        code: code.to_owned(),
        message,
        details,
    };
    Response {
        status,
        location: None,
        body: serde_json::to_value(&body).unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeDelta;
    use serde_json::json;
    use tripwire_core::FixedPlacement;

    fn service(mines: Vec<(u8, u8)>) -> (Arc<ManualClock>, GameService) {
        let clock = Arc::new(ManualClock::default());
        let store = SessionStore::in_memory(Box::new(FixedPlacement(mines)), clock.clone());
        let idempotency = Arc::new(IdempotencyCache::new(TimeDelta::minutes(10), clock.clone()));
        (clock, GameService::new(store, idempotency, Limits::default()))
    }

    fn request(value: Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    fn create(service: &GameService, body: Value) -> String {
        let response = service.handle(request(json!({ "op": "create", "body": body })));
        assert_eq!(response.status, 201, "{:?}", response.body);
        response.body["gameId"].as_str().unwrap().to_owned()
    }

    #[test]
    fn create_echoes_preset_and_location() {
        let (_, service) = service(vec![]);
        let response = service.handle(request(json!({
            "op": "create",
            "body": { "preset": "Medium", "lives": 2 }
        })));

        assert_eq!(response.status, 201);
        let id = response.body["gameId"].as_str().unwrap();
        assert_eq!(response.location, Some(format!("/game/{id}")));
        assert_eq!(response.body["preset"], json!("Medium"));
        assert_eq!(response.body["rows"], json!(16));
        assert_eq!(response.body["status"], json!("new"));
        assert_eq!(response.body["lives"], json!({ "total": 2, "left": 2 }));
    }

    #[test]
    fn idempotent_create_within_ttl() {
        let (clock, service) = service(vec![]);
        let create = || {
            service.handle(request(json!({
                "op": "create",
                "idempotencyKey": "abc",
                "body": { "rows": 5, "cols": 5, "mines": 3 }
            })))
        };

        let first = create();
        clock.advance(TimeDelta::minutes(9));
        let second = create();
        assert_eq!(first, second);

        clock.advance(TimeDelta::minutes(2));
        let third = create();
        assert_eq!(third.status, 201);
        assert_ne!(third.body["gameId"], first.body["gameId"]);
        assert_eq!(third.body["preset"], json!("Custom"));
    }

    #[test]
    fn empty_idempotency_key_creates_new_games() {
        let (_, service) = service(vec![]);
        let create = || {
            service.handle(request(json!({
                "op": "create",
                "idempotencyKey": "",
                "body": { "rows": 5, "cols": 5, "mines": 3 }
            })))
        };

        let first = create();
        let second = create();
        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_ne!(first.body["gameId"], second.body["gameId"]);
        assert!(service.idempotency().is_empty());
    }

    #[test]
    fn create_outside_limits() {
        let (_, service) = service(vec![]);
        for body in [
            json!({ "rows": 2, "cols": 5, "mines": 1 }),
            json!({ "rows": 5, "cols": 31, "mines": 1 }),
            json!({ "rows": 5, "cols": 5, "mines": 0 }),
            json!({ "rows": 5, "cols": 5, "mines": 25 }),
            json!({ "preset": "Easy", "lives": 11 }),
        ] {
            let response = service.handle(request(json!({ "op": "create", "body": body })));
            assert_eq!(response.status, 400, "{body}");
            assert_eq!(response.body["code"], json!("invalid_input"));
        }
        assert!(service.store().backend().is_empty());
    }

    #[test]
    fn unknown_or_malformed_game_id() {
        let (_, service) = service(vec![]);
        for game_id in ["not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
            let response = service.handle(request(json!({ "op": "get", "gameId": game_id })));
            assert_eq!(response.status, 404);
            assert_eq!(
                response.body,
                json!({ "code": "not_found", "message": "Game not found", "details": null })
            );
        }
    }

    #[test]
    fn masks_mines_until_game_ends() {
        let (_, service) = service(vec![(0, 0)]);
        let id = create(&service, json!({ "rows": 3, "cols": 3, "mines": 1, "lives": 1 }));

        let reveal = |row: u8, col: u8| {
            service.handle(request(json!({
                "op": "reveal", "gameId": id, "body": { "row": row, "col": col }
            })))
        };

        let running = reveal(2, 2);
        assert_eq!(running.status, 200);
        assert!(running.body["board"].get("mines").is_none());

        let lost = reveal(0, 0);
        assert_eq!(lost.body["status"], json!("lost"));
        assert_eq!(lost.body["board"]["mines"], json!([{ "row": 0, "col": 0 }]));

        let again = reveal(1, 1);
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], json!("game_over"));
    }

    #[test]
    fn flag_before_reveal_is_unprocessable() {
        let (_, service) = service(vec![(0, 0)]);
        let id = create(&service, json!({ "preset": "Easy" }));
        let response = service.handle(request(json!({
            "op": "flag", "gameId": id, "body": { "row": 1, "col": 1 }
        })));
        assert_eq!(response.status, 422);
        assert_eq!(response.body["code"], json!("not_started"));
    }

    #[test]
    fn negative_indices_clamp_to_start() {
        let (_, service) = service(vec![(0, 0)]);
        let id = create(&service, json!({ "rows": 5, "cols": 5, "mines": 1 }));
        service.handle(request(json!({
            "op": "reveal", "gameId": id, "body": { "row": 4, "col": 4 }
        })));

        let preview = service.handle(request(json!({
            "op": "preview", "gameId": id, "body": { "toIndex": -3 }
        })));
        assert_eq!(preview.body["previewIndex"], json!(0));
        assert_eq!(preview.body["isPreview"], json!(true));
        assert_eq!(preview.body["cursor"], json!(1));

        let seek = service.handle(request(json!({
            "op": "seek", "gameId": id, "body": { "toIndex": -1 }
        })));
        assert_eq!(seek.body["cursor"], json!(0));
        assert_eq!(seek.body["totalActions"], json!(1));
    }

    #[test]
    fn hint_and_mode_bodies() {
        let (_, service) = service(vec![(0, 0)]);
        let id = create(&service, json!({ "rows": 5, "cols": 5, "mines": 1 }));

        let hint = service.handle(request(json!({ "op": "hint", "gameId": id })));
        assert_eq!(hint.body, json!({ "type": "none" }));

        let mode = service.handle(request(json!({
            "op": "mode", "gameId": id, "body": { "quickFlag": true }
        })));
        assert_eq!(mode.body, json!({ "ok": true, "quickFlagEnabled": true }));
    }

    #[test]
    fn capabilities_report_limits() {
        let (_, service) = service(vec![]);
        let response = service.handle(Request::Capabilities);
        assert_eq!(response.status, 200);
        assert_eq!(response.body["limits"]["mines"], json!({ "min": 1, "max": 900 }));
        assert_eq!(response.body["features"]["undo"], json!(true));
        assert_eq!(response.body["presets"][0]["name"], json!("Easy"));
    }

    #[test]
    fn malformed_line_is_bad_request() {
        let err = serde_json::from_str::<Request>("{\"op\":\"explode\"}").unwrap_err();
        let response = malformed_request(&err);
        assert_eq!(response.status, 400);
        assert_eq!(response.body["code"], json!("invalid_input"));
        assert!(response.body["details"].is_string());
    }

    #[test]
    fn mask_check_rejects_leaks() {
        let (_, service) = service(vec![(0, 0)]);
        let id = create(&service, json!({ "rows": 3, "cols": 3, "mines": 1 }));
        let mut view = service.store().get(&parse_id(&id).unwrap()).unwrap();
        view.board.mines = Some(vec![CellRef { row: 0, col: 0 }]);
        assert_eq!(checked(view), Err(SessionError::MineLeak));
    }
}
