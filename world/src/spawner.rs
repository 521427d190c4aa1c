use std::{
    fmt, io,
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Instant,
};

use world_core::{HealthCount, RuntimeParams, World, WorldError, WorldParams};

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Delete,
    /// run until the given day
    Start(u32),
    Step,
    Stop,
    Reset,
}

#[derive(Debug, PartialEq)]
pub enum Response {
    Ok(ResponseOk),
    Err(ResponseError),
}

impl Response {
    #[inline]
    pub fn as_result(self) -> Result<ResponseOk, ResponseError> {
        match self {
            Response::Ok(r) => Ok(r),
            Response::Err(e) => Err(e),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ResponseOk {
    Success,
    SuccessWithMessage(String),
}

impl From<ResponseOk> for Response {
    fn from(r: ResponseOk) -> Self {
        Response::Ok(r)
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ResponseError {
    #[error("world is already finished")]
    AlreadyEnded,
    #[error("world is already stopped")]
    AlreadyStopped,
    #[error("world is already running")]
    AlreadyStarted,
}

impl From<ResponseError> for Response {
    fn from(e: ResponseError) -> Self {
        Response::Err(e)
    }
}

/// The other end of the channels went away.
#[derive(Debug, thiserror::Error)]
#[error("subscriber disconnected")]
pub struct Disconnected;

impl<T> From<mpsc::SendError<T>> for Disconnected {
    fn from(_: mpsc::SendError<T>) -> Self {
        Disconnected
    }
}

pub struct MpscPublisher {
    stream_tx: mpsc::Sender<WorldStatus>,
    req_rx: mpsc::Receiver<Request>,
    res_tx: mpsc::Sender<Response>,
}

impl MpscPublisher {
    pub fn new(
        stream_tx: mpsc::Sender<WorldStatus>,
        req_rx: mpsc::Receiver<Request>,
        res_tx: mpsc::Sender<Response>,
    ) -> Self {
        Self {
            stream_tx,
            req_rx,
            res_tx,
        }
    }

    fn try_recv(&self) -> Result<Option<Request>, Disconnected> {
        match self.req_rx.try_recv() {
            Ok(r) => Ok(Some(r)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(Disconnected),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("receive error")]
    RecvError(#[from] mpsc::RecvError),
    #[error("send error")]
    SendError(#[from] mpsc::SendError<Request>),
}

pub struct MpscSubscriber {
    req_tx: mpsc::Sender<Request>,
    res_rx: mpsc::Receiver<Response>,
    stream_rx: mpsc::Receiver<WorldStatus>,
}

impl MpscSubscriber {
    pub fn new(
        req_tx: mpsc::Sender<Request>,
        res_rx: mpsc::Receiver<Response>,
        stream_rx: mpsc::Receiver<WorldStatus>,
    ) -> Self {
        Self {
            req_tx,
            res_rx,
            stream_rx,
        }
    }

    pub fn recv_status(&self) -> Result<WorldStatus, mpsc::RecvError> {
        self.stream_rx.recv()
    }

    /// Drains the statuses published so far.
    pub fn seek_status(&self) -> Vec<WorldStatus> {
        self.stream_rx.try_iter().collect()
    }

    pub fn request(&self, req: Request) -> Result<Response, RequestError> {
        self.req_tx.send(req)?;
        Ok(self.res_rx.recv()?)
    }
}

/// Creates a world on its own thread, wired to a subscriber through channels.
pub fn channel(
    id: String,
    runtime_params: RuntimeParams,
    world_params: WorldParams,
) -> Result<(WorldSpawner, MpscSubscriber), WorldError> {
    let (req_tx, req_rx) = mpsc::channel();
    let (res_tx, res_rx) = mpsc::channel();
    let (stream_tx, stream_rx) = mpsc::channel();
    let spawner = WorldSpawner::new(
        id,
        MpscPublisher::new(stream_tx, req_rx, res_tx),
        runtime_params,
        world_params,
    )?;
    Ok((spawner, MpscSubscriber::new(req_tx, res_rx, stream_rx)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldState {
    Stopped,
    Started,
    Ended,
}

#[derive(Clone, Debug)]
pub struct WorldStatus {
    pub tick: u64,
    pub day: u32,
    pub state: WorldState,
    pub counts: HealthCount,
    pub ticks_per_sec: f64,
    time_stamp: chrono::DateTime<chrono::Utc>,
}

impl WorldStatus {
    fn new(world: &World, state: WorldState, ticks_per_sec: f64) -> Self {
        Self {
            tick: world.current_tick(),
            day: world.current_day(),
            state,
            counts: world.counts(),
            ticks_per_sec,
            time_stamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for WorldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] day:{},tick:{},mode:{:?},{:.1}tps | {}",
            self.time_stamp, self.day, self.tick, self.state, self.ticks_per_sec, self.counts
        )
    }
}

#[derive(Default, Debug)]
struct WorldStepInfo {
    prev_time: Option<Instant>,
    ticks_per_sec: f64,
}

impl WorldStepInfo {
    /// Smoothed tick rate.
    fn update(&mut self) {
        let now = Instant::now();
        if let Some(prev) = self.prev_time {
            let passed = now.duration_since(prev).as_secs_f64();
            if passed > 0.0 && passed < 1.0 {
                self.ticks_per_sec += ((1.0 / passed).min(1000.0) - self.ticks_per_sec) * 0.2;
            }
        }
        self.prev_time = Some(now);
    }
}

pub struct WorldSpawner {
    world: World,
    info: WorldStepInfo,
    publisher: MpscPublisher,
}

impl WorldSpawner {
    pub fn new(
        id: String,
        publisher: MpscPublisher,
        runtime_params: RuntimeParams,
        world_params: WorldParams,
    ) -> Result<Self, WorldError> {
        let mut world = World::new(id, runtime_params, world_params)?;
        world.stop();
        Ok(Self {
            world,
            info: WorldStepInfo::default(),
            publisher,
        })
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("world_{}", self.world.id))
            .spawn(move || self.listen())
    }

    #[inline]
    fn res_ok(&self) -> Result<(), Disconnected> {
        Ok(self.publisher.res_tx.send(ResponseOk::Success.into())?)
    }

    #[inline]
    fn res_ok_with(&self, msg: String) -> Result<(), Disconnected> {
        Ok(self
            .publisher
            .res_tx
            .send(ResponseOk::SuccessWithMessage(msg).into())?)
    }

    #[inline]
    fn res_err(&self, err: ResponseError) -> Result<(), Disconnected> {
        Ok(self.publisher.res_tx.send(err.into())?)
    }

    #[inline]
    fn send_status(&self, state: WorldState) -> Result<(), Disconnected> {
        let status = WorldStatus::new(&self.world, state, self.info.ticks_per_sec);
        Ok(self.publisher.stream_tx.send(status)?)
    }

    fn reset(&mut self) -> Result<(), Disconnected> {
        self.world.reset();
        self.world.stop();
        self.info = WorldStepInfo::default();
        self.send_status(WorldState::Stopped)?;
        self.res_ok()
    }

    fn step(&mut self) -> Result<(), Disconnected> {
        if self.world.is_ended() {
            return self.res_err(ResponseError::AlreadyEnded);
        }
        self.world.start();
        self.inline_step();
        self.world.stop();
        let state = if self.world.is_ended() {
            WorldState::Ended
        } else {
            WorldState::Stopped
        };
        self.send_status(state)?;
        self.res_ok()
    }

    fn stop(&mut self) -> Result<(), Disconnected> {
        self.world.stop();
        self.send_status(WorldState::Stopped)?;
        self.res_ok()
    }

    /// Runs until `stop_at` or the end of the world, answering requests in
    /// between ticks. Returns `true` when the world was deleted.
    fn start(&mut self, stop_at: u32) -> Result<bool, Disconnected> {
        if self.world.is_ended() {
            self.res_err(ResponseError::AlreadyEnded)?;
            return Ok(false);
        }
        let day = self.world.current_day();
        if day >= stop_at {
            self.res_ok_with(format!("already at day {day}"))?;
            return Ok(false);
        }
        self.world.start();
        self.res_ok()?;
        while self.step_cont(stop_at)? {
            if let Some(msg) = self.publisher.try_recv()? {
                match msg {
                    Request::Delete => {
                        self.res_ok()?;
                        return Ok(true);
                    }
                    Request::Stop => {
                        self.stop()?;
                        break;
                    }
                    Request::Reset => {
                        self.reset()?;
                        break;
                    }
                    _ => self.res_err(ResponseError::AlreadyStarted)?,
                }
            }
        }
        self.world.stop();
        Ok(false)
    }

    fn step_cont(&mut self, stop_at: u32) -> Result<bool, Disconnected> {
        self.inline_step();
        let (state, cont) = if self.world.is_ended() {
            (WorldState::Ended, false)
        } else if self.world.current_day() >= stop_at {
            (WorldState::Stopped, false)
        } else {
            (WorldState::Started, true)
        };
        self.send_status(state)?;
        Ok(cont)
    }

    #[inline]
    fn inline_step(&mut self) {
        self.world.tick();
        self.info.update();
    }

    fn serve(&mut self) -> Result<(), Disconnected> {
        self.send_status(WorldState::Stopped)?;
        while let Ok(req) = self.publisher.req_rx.recv() {
            match req {
                Request::Delete => {
                    self.res_ok()?;
                    break;
                }
                Request::Reset => self.reset()?,
                Request::Step => self.step()?,
                Request::Start(stop_at) => {
                    if self.start(stop_at)? {
                        break;
                    }
                }
                Request::Stop => self.res_err(ResponseError::AlreadyStopped)?,
            }
        }
        Ok(())
    }

    fn listen(mut self) {
        if let Err(e) = self.serve() {
            tracing::warn!(id = %self.world.id, "{e}");
        }
        tracing::info!(id = %self.world.id, "world thread stopped");
    }
}
