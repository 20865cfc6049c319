//! 플러그인 생명주기 — 등록, 일괄 기동/정지, 건강 점검
//!
//! 데몬에 올라가는 모듈은 [`Plugin`] trait을 구현해 [`PluginRegistry`]에
//! 등록되고, 레지스트리가 등록 순서 그대로 init/start/stop을 일괄
//! 수행합니다.
//!
//! # 생명주기
//! ```text
//! Created → init() → Initialized → start() → Running → stop() → Stopped
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, WatchpostError};

/// dyn trait 경계를 넘는 비동기 메서드의 반환 타입
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─── HealthStatus ────────────────────────────────────────────────────

/// `health_check()`가 보고하는 모듈 건강 상태
///
/// 정상이 아닌 두 단계는 운영자에게 보여줄 사유 문자열을 함께 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작은 하지만 일부 기능이 저하됨
    Degraded(String),
    /// 동작 불능
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 여부를 반환합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불능 여부를 반환합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

// ─── PluginType ──────────────────────────────────────────────────────

/// 플러그인 분류
///
/// watchpost가 내장하는 두 모듈 외에 외부 확장은 `Custom`으로 수용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginType {
    /// eve.json 수집과 정규화를 담당하는 파이프라인
    Pipeline,
    /// 대시보드로 알림을 내보내는 스트리밍 게이트웨이
    Gateway,
    /// 외부에서 제공되는 확장 플러그인
    Custom(String),
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline => write!(f, "pipeline"),
            Self::Gateway => write!(f, "gateway"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

// ─── PluginInfo ──────────────────────────────────────────────────────

/// 플러그인이 등록 시 제출하는 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// 레지스트리 안에서 유일해야 하는 이름 (예: `"eve-pipeline"`)
    pub name: String,
    /// semver 형식 버전 문자열
    pub version: String,
    /// 한 줄 설명
    pub description: String,
    /// 분류
    pub plugin_type: PluginType,
}

// ─── PluginState ─────────────────────────────────────────────────────

/// 플러그인 생명주기 상태
///
/// `init()` / `start()` / `stop()` 호출이 순서대로
/// `Created` → `Initialized` → `Running` → `Stopped`로 전이시키며,
/// 어느 단계든 실패하면 `Failed`로 남습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginState {
    /// 생성 직후, 아직 init 전
    Created,
    /// init 완료, start 대기
    Initialized,
    /// 실행 중
    Running,
    /// 정지 완료
    Stopped,
    /// 생명주기 도중 실패
    Failed,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ─── Plugin trait ────────────────────────────────────────────────────

/// 데몬이 관리하는 모듈의 공통 생명주기 trait
///
/// 비동기 메서드는 RPITIT로 선언되어 구현체가 `async fn`을 그대로 쓸 수
/// 있습니다. 동적 디스패치가 필요한 자리에는 [`DynPlugin`]을 사용합니다.
///
/// # 구현 예시
/// ```ignore
/// impl Plugin for EveModule {
///     fn info(&self) -> &PluginInfo { &self.info }
///     fn state(&self) -> PluginState { self.state }
///
///     async fn init(&mut self) -> Result<(), WatchpostError> { self.prepare().await }
///     async fn start(&mut self) -> Result<(), WatchpostError> { self.spawn_tasks().await }
///     async fn stop(&mut self) -> Result<(), WatchpostError> { self.shutdown().await }
///     async fn health_check(&self) -> HealthStatus { HealthStatus::Healthy }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// 등록 시 제출한 메타데이터를 반환합니다.
    fn info(&self) -> &PluginInfo;

    /// 현재 생명주기 상태를 반환합니다.
    fn state(&self) -> PluginState;

    /// 리소스를 준비하고 설정을 검증합니다.
    ///
    /// `Created` 상태에서 한 번만 호출됩니다.
    fn init(&mut self) -> impl Future<Output = Result<(), WatchpostError>> + Send;

    /// 백그라운드 작업을 기동합니다.
    ///
    /// `Initialized` 상태에서만 호출할 수 있습니다. 정지한 플러그인을
    /// 다시 시작하려면 새로 만들어야 합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), WatchpostError>> + Send;

    /// 실행 중인 작업을 정리하고 종료합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), WatchpostError>> + Send;

    /// 현재 건강 상태를 보고합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

// ─── DynPlugin ───────────────────────────────────────────────────────

/// [`Plugin`]의 dyn-compatible 대응물
///
/// RPITIT 메서드는 vtable에 올릴 수 없어 `dyn Plugin`이 성립하지
/// 않으므로, 레지스트리는 [`BoxFuture`]를 반환하는 이 trait으로
/// 플러그인을 보관합니다. [`Plugin`] 구현체는 아래 블랭킷 impl을 통해
/// 자동으로 변환됩니다.
pub trait DynPlugin: Send + Sync {
    /// 등록 시 제출한 메타데이터를 반환합니다.
    fn info(&self) -> &PluginInfo;

    /// 현재 생명주기 상태를 반환합니다.
    fn state(&self) -> PluginState;

    /// [`Plugin::init`]의 박스 퓨처 버전입니다.
    fn init(&mut self) -> BoxFuture<'_, Result<(), WatchpostError>>;

    /// [`Plugin::start`]의 박스 퓨처 버전입니다.
    fn start(&mut self) -> BoxFuture<'_, Result<(), WatchpostError>>;

    /// [`Plugin::stop`]의 박스 퓨처 버전입니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), WatchpostError>>;

    /// [`Plugin::health_check`]의 박스 퓨처 버전입니다.
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

impl<T: Plugin> DynPlugin for T {
    fn info(&self) -> &PluginInfo {
        Plugin::info(self)
    }

    fn state(&self) -> PluginState {
        Plugin::state(self)
    }

    fn init(&mut self) -> BoxFuture<'_, Result<(), WatchpostError>> {
        Box::pin(Plugin::init(self))
    }

    fn start(&mut self) -> BoxFuture<'_, Result<(), WatchpostError>> {
        Box::pin(Plugin::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), WatchpostError>> {
        Box::pin(Plugin::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Plugin::health_check(self))
    }
}

impl fmt::Debug for dyn DynPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynPlugin")
            .field("name", &self.info().name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ─── PluginRegistry ──────────────────────────────────────────────────

/// [`PluginRegistry::health_check_all`]이 플러그인마다 돌려주는 점검 결과
#[derive(Debug, Clone)]
pub struct PluginHealth {
    /// 플러그인 이름
    pub name: String,
    /// 점검 시점의 생명주기 상태
    pub state: PluginState,
    /// 점검 결과
    pub health: HealthStatus,
}

/// 등록 순서를 보존하는 플러그인 컨테이너
///
/// 생산자 플러그인을 소비자보다 먼저 등록해 두면 기동도 정지도 생산자가
/// 먼저이므로, 정지 국면에서 소비자가 잔여 이벤트를 비울 수 있습니다.
///
/// # 사용 예시
/// ```ignore
/// let mut registry = PluginRegistry::new();
/// registry.register(Box::new(eve_pipeline))?;
/// registry.register(Box::new(stream_gateway))?;
///
/// registry.init_all().await?;
/// registry.start_all().await?;
/// // ...
/// registry.stop_all().await?;
/// ```
#[derive(Debug)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn DynPlugin>>,
}

impl PluginRegistry {
    /// 빈 레지스트리를 만듭니다.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.info().name == name)
    }

    /// 플러그인을 등록합니다.
    ///
    /// 이름이 겹치면 [`PluginError::AlreadyRegistered`]를 반환하고
    /// 기존 등록은 그대로 둡니다.
    pub fn register(&mut self, plugin: Box<dyn DynPlugin>) -> Result<(), WatchpostError> {
        let name = &plugin.info().name;
        if self.index_of(name).is_some() {
            return Err(PluginError::AlreadyRegistered { name: name.clone() }.into());
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// 플러그인을 빼내어 소유권을 돌려줍니다.
    ///
    /// 등록되어 있지 않으면 [`PluginError::NotFound`]입니다.
    pub fn unregister(&mut self, name: &str) -> Result<Box<dyn DynPlugin>, WatchpostError> {
        match self.index_of(name) {
            Some(idx) => Ok(self.plugins.remove(idx)),
            None => Err(PluginError::NotFound {
                name: name.to_owned(),
            }
            .into()),
        }
    }

    /// 이름으로 플러그인을 찾습니다.
    pub fn get(&self, name: &str) -> Option<&dyn DynPlugin> {
        let idx = self.index_of(name)?;
        Some(self.plugins[idx].as_ref())
    }

    /// 이름으로 플러그인을 찾아 가변 참조를 돌려줍니다.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn DynPlugin> {
        let idx = self.index_of(name)?;
        Some(self.plugins[idx].as_mut())
    }

    /// 모든 플러그인을 등록 순서대로 init합니다.
    ///
    /// 하나라도 실패하면 그 자리에서 에러를 돌려주고 뒤의 플러그인은
    /// 건드리지 않습니다.
    pub async fn init_all(&mut self) -> Result<(), WatchpostError> {
        for plugin in &mut self.plugins {
            plugin.init().await?;
        }
        Ok(())
    }

    /// 모든 플러그인을 등록 순서대로 start합니다.
    ///
    /// 실패 시 즉시 반환하며, 이미 시작된 앞쪽 플러그인의 정리는
    /// 호출자의 `stop_all` 몫입니다.
    pub async fn start_all(&mut self) -> Result<(), WatchpostError> {
        for plugin in &mut self.plugins {
            plugin.start().await?;
        }
        Ok(())
    }

    /// 모든 플러그인을 등록 순서대로 stop합니다.
    ///
    /// 개별 실패는 기록만 하고 끝까지 진행한 뒤, 실패가 있었다면
    /// 플러그인 이름과 함께 모아 하나의 에러로 돌려줍니다.
    pub async fn stop_all(&mut self) -> Result<(), WatchpostError> {
        let mut failures = Vec::new();
        for plugin in &mut self.plugins {
            let name = plugin.info().name.clone();
            if let Err(e) = plugin.stop().await {
                failures.push(format!("{name}: {e}"));
            }
        }
        if failures.is_empty() {
            return Ok(());
        }
        Err(PluginError::StopFailed(failures.join("; ")).into())
    }

    /// 등록된 플러그인 수를 반환합니다.
    pub fn count(&self) -> usize {
        self.plugins.len()
    }

    /// 등록 순서 그대로의 메타데이터 목록을 반환합니다.
    pub fn list(&self) -> Vec<&PluginInfo> {
        self.plugins.iter().map(|p| p.info()).collect()
    }

    /// 전 플러그인의 건강을 점검해 등록 순서대로 돌려줍니다.
    pub async fn health_check_all(&self) -> Vec<PluginHealth> {
        let mut report = Vec::with_capacity(self.plugins.len());
        for plugin in &self.plugins {
            report.push(PluginHealth {
                name: plugin.info().name.clone(),
                state: plugin.state(),
                health: plugin.health_check().await,
            });
        }
        report
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
