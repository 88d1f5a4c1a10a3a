//! Pointer reachability probe.
//!
//! An element is reachable when a pointer event dispatched at the center of
//! its bounding box lands on the element itself or on one of its
//! descendants. Elements with no area, or whose center lies outside the
//! viewport, are a visibility concern: they get no result and are listed as
//! excluded instead.

use serde::Serialize;
use tracing::{debug, info};

use crate::document::{ElementRef, RenderedDocument, ViewportInfo, ZIndex};
use crate::error::{DocumentError, LayeringError};

/// Outcome of probing one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachabilityResult {
    pub element: ElementRef,
    pub clickable: bool,
    /// Topmost element at the probe point when the element is not reachable.
    pub blocking_element: Option<ElementRef>,
    pub effective_z_index: ZIndex,
    /// Viewport point that was hit-tested.
    pub point: (f64, f64),
}

impl ReachabilityResult {
    pub fn is_negative(&self) -> bool {
        !self.clickable
    }
}

/// Why an element was left out of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Not laid out or collapsed.
    ZeroArea,
    /// Center point outside the viewport, e.g. below the fold.
    OutsideViewport,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::ZeroArea => f.write_str("zero area"),
            ExclusionReason::OutsideViewport => f.write_str("outside viewport"),
        }
    }
}

/// An element that was not hit-tested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedElement {
    pub element: ElementRef,
    pub reason: ExclusionReason,
}

/// Results of one pass plus the elements it skipped, both in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbePass {
    pub results: Vec<ReachabilityResult>,
    pub excluded: Vec<ExcludedElement>,
}

/// Verifies that interactive elements can receive pointer events.
pub struct ReachabilityProbe;

impl ReachabilityProbe {
    /// Interactive controls of the document, in document order.
    pub async fn interactive_elements<D>(document: &D) -> Result<Vec<ElementRef>, LayeringError>
    where
        D: RenderedDocument + ?Sized,
    {
        let elements = document.elements().await?;
        Ok(elements.into_iter().filter(ElementRef::is_interactive).collect())
    }

    /// Probe each element. Results keep the input order; excluded elements
    /// produce no entry.
    pub async fn verify<D>(
        document: &D,
        elements: &[ElementRef],
    ) -> Result<Vec<ReachabilityResult>, LayeringError>
    where
        D: RenderedDocument + ?Sized,
    {
        Ok(Self::measure(document, elements).await?.results)
    }

    /// Like [`verify`](Self::verify), but also reports which elements were
    /// excluded and why.
    pub async fn measure<D>(document: &D, elements: &[ElementRef]) -> Result<ProbePass, LayeringError>
    where
        D: RenderedDocument + ?Sized,
    {
        let viewport = document.viewport().await?;
        let mut pass = ProbePass {
            results: Vec::with_capacity(elements.len()),
            excluded: Vec::new(),
        };

        for element in elements {
            match Self::probe(document, &viewport, element).await? {
                Ok(result) => pass.results.push(result),
                Err(reason) => pass.excluded.push(ExcludedElement {
                    element: element.clone(),
                    reason,
                }),
            }
        }

        let negatives = pass.results.iter().filter(|r| r.is_negative()).count();
        info!(
            "Probed {} elements: {} reachable, {} blocked, {} excluded",
            elements.len(),
            pass.results.len() - negatives,
            negatives,
            pass.excluded.len()
        );
        Ok(pass)
    }

    async fn probe<D>(
        document: &D,
        viewport: &ViewportInfo,
        element: &ElementRef,
    ) -> Result<Result<ReachabilityResult, ExclusionReason>, DocumentError>
    where
        D: RenderedDocument + ?Sized,
    {
        let bounds = document.bounding_box(element.node).await?;
        if bounds.is_empty() {
            debug!("{} excluded: zero area", element);
            return Ok(Err(ExclusionReason::ZeroArea));
        }

        let (x, y) = bounds.center();
        if !viewport.contains(x, y) {
            debug!("{} excluded: center ({}, {}) outside viewport", element, x, y);
            return Ok(Err(ExclusionReason::OutsideViewport));
        }

        let stack = document.hit_test(x, y).await?;
        let clickable = match stack.first() {
            Some(top) => top.node == element.node || document.contains(element.node, top.node).await?,
            None => false,
        };

        let blocking_element = if clickable {
            None
        } else {
            stack.into_iter().next()
        };

        let effective_z_index = ZIndex::parse(&document.computed_style(element.node, "z-index").await?);

        match blocking_element {
            Some(ref blocker) => debug!("{} blocked by {}", element, blocker),
            None if !clickable => debug!("{} blocked: nothing hit at ({}, {})", element, x, y),
            None => {}
        }

        Ok(Ok(ReachabilityResult {
            element: element.clone(),
            clickable,
            blocking_element,
            effective_z_index,
            point: (x, y),
        }))
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
