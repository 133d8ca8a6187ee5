use super::solver::CubicBezierSolver;
use glam::{DAffine2, DVec2};
use kurbo::{BezPath, Rect};

/// How the two tangents of a point relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointType {
    #[default]
    Corner,
    /// Collinear tangents of independent length
    Smooth,
    /// Collinear tangents of equal length
    Symmetrical,
}

impl PointType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PointType::Smooth,
            2 => PointType::Symmetrical,
            _ => PointType::Corner,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PointType::Corner => 0,
            PointType::Smooth => 1,
            PointType::Symmetrical => 2,
        }
    }
}

/// Vertex with absolute tangent positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BezierPoint {
    pub pos: DVec2,
    pub tan_in: DVec2,
    pub tan_out: DVec2,
    pub kind: PointType,
}

impl BezierPoint {
    pub fn new(pos: DVec2, tan_in: DVec2, tan_out: DVec2, kind: PointType) -> Self {
        Self {
            pos,
            tan_in,
            tan_out,
            kind,
        }
    }

    pub fn corner(pos: DVec2) -> Self {
        Self::new(pos, pos, pos, PointType::Corner)
    }

    pub fn from_relative(pos: DVec2, in_rel: DVec2, out_rel: DVec2, kind: PointType) -> Self {
        Self::new(pos, pos + in_rel, pos + out_rel, kind)
    }

    pub fn relative_tan_in(&self) -> DVec2 {
        self.tan_in - self.pos
    }

    pub fn relative_tan_out(&self) -> DVec2 {
        self.tan_out - self.pos
    }

    /// Changes the type, moving the tangents to satisfy it.
    pub fn set_point_type(&mut self, kind: PointType) {
        let in_len = self.relative_tan_in().length();
        let out_len = self.relative_tan_out().length();
        let direction = (self.tan_out - self.tan_in).normalize_or_zero();

        if direction != DVec2::ZERO {
            match kind {
                PointType::Corner => {}
                PointType::Smooth => {
                    self.tan_in = self.pos - direction * in_len;
                    self.tan_out = self.pos + direction * out_len;
                }
                PointType::Symmetrical => {
                    let len = (in_len + out_len) / 2.0;
                    self.tan_in = self.pos - direction * len;
                    self.tan_out = self.pos + direction * len;
                }
            }
        }
        self.kind = kind;
    }

    /// Moves the incoming tangent, keeping the outgoing one consistent with
    /// the point type.
    pub fn drag_tan_in(&mut self, tan_in: DVec2) {
        self.tan_in = tan_in;
        self.tan_out = Self::opposite(self.kind, self.pos, tan_in, self.tan_out);
    }

    pub fn drag_tan_out(&mut self, tan_out: DVec2) {
        self.tan_out = tan_out;
        self.tan_in = Self::opposite(self.kind, self.pos, tan_out, self.tan_in);
    }

    fn opposite(kind: PointType, pos: DVec2, dragged: DVec2, other: DVec2) -> DVec2 {
        match kind {
            PointType::Corner => other,
            PointType::Smooth => {
                let len = (other - pos).length();
                pos - (dragged - pos).normalize_or_zero() * len
            }
            PointType::Symmetrical => pos * 2.0 - dragged,
        }
    }

    pub fn translate(&mut self, delta: DVec2) {
        self.pos += delta;
        self.tan_in += delta;
        self.tan_out += delta;
    }

    pub fn transformed(&self, matrix: &DAffine2) -> Self {
        Self::new(
            matrix.transform_point2(self.pos),
            matrix.transform_point2(self.tan_in),
            matrix.transform_point2(self.tan_out),
            self.kind,
        )
    }

    fn reversed(self) -> Self {
        Self::new(self.pos, self.tan_out, self.tan_in, self.kind)
    }
}

/// Open or closed sequence of cubic segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bezier {
    points: Vec<BezierPoint>,
    closed: bool,
}

impl Bezier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<BezierPoint>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn points(&self) -> &[BezierPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut Vec<BezierPoint> {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn push(&mut self, point: BezierPoint) -> &mut Self {
        self.points.push(point);
        self
    }

    /// Appends a corner point.
    pub fn add_point(&mut self, pos: DVec2) -> &mut Self {
        self.push(BezierPoint::corner(pos))
    }

    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Segment `index` runs from point `index` to the next one, wrapping
    /// around on closed paths.
    pub fn segment(&self, index: usize) -> CubicBezierSolver<DVec2> {
        let from = &self.points[index];
        let to = &self.points[(index + 1) % self.points.len()];
        CubicBezierSolver::new(from.pos, from.tan_out, to.tan_in, to.pos)
    }

    /// Point on segment `index` at `t`, with tangents that keep the curve
    /// unchanged if it were inserted there.
    pub fn split_segment_point(&self, index: usize, t: f64) -> BezierPoint {
        let (left, right) = self.segment(index).split(t);
        BezierPoint::new(left[3], left[2], right[1], PointType::Smooth)
    }

    /// Open path running from `start` to `end`, each given as
    /// `(segment index, t)`. Returns an empty path if `end` precedes `start`.
    pub fn sub_path(&self, start: (usize, f64), end: (usize, f64)) -> Bezier {
        let mut out = Bezier::new();
        let count = self.segment_count();
        if count == 0 {
            return out;
        }

        let (mut segment, mut t0) = (start.0.min(count - 1), start.1);
        let (end_segment, end_t) = (end.0.min(count - 1), end.1);
        if (end_segment, end_t) < (segment, t0) {
            return out;
        }

        loop {
            let t1 = if segment == end_segment { end_t } else { 1.0 };
            let part = sub_segment(&self.segment(segment), t0, t1);

            match out.points.last_mut() {
                Some(last) => last.tan_out = part[1],
                None => out.points.push(BezierPoint::new(part[0], part[0], part[1], PointType::Corner)),
            }

            let kind = if segment == end_segment {
                PointType::Corner
            } else {
                self.points[(segment + 1) % self.points.len()].kind
            };
            out.points.push(BezierPoint::new(part[3], part[2], part[3], kind));

            if segment == end_segment {
                break;
            }
            segment += 1;
            t0 = 0.0;
        }

        out
    }

    pub fn reversed(&self) -> Bezier {
        Bezier {
            points: self.points.iter().rev().map(|p| p.reversed()).collect(),
            closed: self.closed,
        }
    }

    pub fn transformed(&self, matrix: &DAffine2) -> Bezier {
        Bezier {
            points: self.points.iter().map(|p| p.transformed(matrix)).collect(),
            closed: self.closed,
        }
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let mut rect = Rect::from_points((first.pos.x, first.pos.y), (first.pos.x, first.pos.y));
        for i in 0..self.segment_count() {
            rect = rect.union(self.segment(i).bounding_rect());
        }
        Some(rect)
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        self.append_to(&mut path);
        path
    }

    fn append_to(&self, path: &mut BezPath) {
        let Some(first) = self.points.first() else {
            return;
        };
        path.move_to((first.pos.x, first.pos.y));
        for i in 0..self.segment_count() {
            let [_, p1, p2, p3] = *self.segment(i).points();
            path.curve_to((p1.x, p1.y), (p2.x, p2.y), (p3.x, p3.y));
        }
        if self.closed {
            path.close_path();
        }
    }
}

fn sub_segment(segment: &CubicBezierSolver<DVec2>, t0: f64, t1: f64) -> [DVec2; 4] {
    if t0 <= 0.0 {
        if t1 >= 1.0 {
            return *segment.points();
        }
        return segment.split(t1).0;
    }
    let (_, right) = segment.split(t0);
    let local = if t0 >= 1.0 { 0.0 } else { (t1 - t0) / (1.0 - t0) };
    CubicBezierSolver::from_points(right).split(local).0
}

/// Several independent beziers forming one shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiBezier {
    beziers: Vec<Bezier>,
}

impl MultiBezier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beziers(&self) -> &[Bezier] {
        &self.beziers
    }

    pub fn beziers_mut(&mut self) -> &mut Vec<Bezier> {
        &mut self.beziers
    }

    pub fn push(&mut self, bezier: Bezier) {
        self.beziers.push(bezier);
    }

    pub fn append(&mut self, other: MultiBezier) {
        self.beziers.extend(other.beziers);
    }

    pub fn len(&self) -> usize {
        self.beziers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beziers.is_empty()
    }

    pub fn transformed(&self, matrix: &DAffine2) -> MultiBezier {
        self.beziers.iter().map(|b| b.transformed(matrix)).collect()
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.beziers
            .iter()
            .filter_map(Bezier::bounding_box)
            .reduce(|a, b| a.union(b))
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for bezier in &self.beziers {
            bezier.append_to(&mut path);
        }
        path
    }
}

impl From<Bezier> for MultiBezier {
    fn from(bezier: Bezier) -> Self {
        Self {
            beziers: vec![bezier],
        }
    }
}

impl FromIterator<Bezier> for MultiBezier {
    fn from_iter<I: IntoIterator<Item = Bezier>>(iter: I) -> Self {
        Self {
            beziers: iter.into_iter().collect(),
        }
    }
}
