use crate::errors::Result;
use crate::models::Series;
use async_trait::async_trait;
use tracing::warn;

/// Something that can draw series as a chart and tear it down again.
#[async_trait]
pub trait ChartRenderer: Send {
    type Chart: Send;

    async fn draw(&mut self, series: &[Series]) -> Result<Self::Chart>;

    async fn destroy(&mut self, chart: Self::Chart) -> Result<()>;
}

/// Sole owner of the chart currently on screen.
pub struct RenderController<R: ChartRenderer> {
    renderer: R,
    chart: Option<R::Chart>,
}

impl<R: ChartRenderer> RenderController<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            chart: None,
        }
    }

    /// Replaces the current chart. If drawing fails no chart is left behind.
    pub async fn render(&mut self, series: &[Series]) -> Result<()> {
        self.dispose().await;
        let chart = self.renderer.draw(series).await?;
        self.chart = Some(chart);
        Ok(())
    }

    pub async fn dispose(&mut self) {
        if let Some(chart) = self.chart.take() {
            if let Err(err) = self.renderer.destroy(chart).await {
                warn!("failed to destroy chart: {err}");
            }
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.chart.is_some()
    }

    pub fn chart(&self) -> Option<&R::Chart> {
        self.chart.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
