use glam::{ Vec3, vec3 };

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AABB {
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, PartialEq)]
pub enum IntersectType {
    DoesNotIntersect,
    Intersects(AABB), // Contains the AABB of the intersection
    Contains,
}

impl AABB {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub const ONE_CUBIC_METER: Self = Self {
        start: Vec3::ZERO,
        end: Vec3::ONE,
    };

    pub fn contains(&self, point: Vec3) -> bool
    {
        return point.to_array().iter()
                .zip(self.start.to_array().iter()
                .zip(self.end.to_array().iter()))
                .all(|(point, (start, end))|
                {
                    point >= start && point <= end
                })
    }

    pub fn from_extents(pos: Vec3, extents: Vec3) -> Self {
        let half_extents = extents / 2.0;
        return Self {
            start: pos - half_extents,
            end: pos + half_extents,
        };
    }

    pub fn from_radius(pos: Vec3, radius: f32) -> Self {
        let radius_vec = vec3(radius, radius, radius);
        Self {
            start: pos - radius_vec,
            end: pos + radius_vec,
        }
    }

    /// Intersects `other` with this box.
    ///
    /// `Contains` means `other` lies entirely inside `self`.
    pub fn intersect(&self, other: AABB) -> IntersectType {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);

        if start.cmpgt(end).any() {
            return IntersectType::DoesNotIntersect;
        }

        let overlap = AABB { start, end };
        if overlap == other {
            IntersectType::Contains
        }
        else {
            IntersectType::Intersects(overlap)
        }
    }

    /// Slab test. Returns the parametric range `(t_enter, t_exit)` over which
    /// `origin + t * direction` lies inside the box, or `None` if the line
    /// misses it. `t_enter` may be negative when the origin is inside.
    pub fn ray_intersection(&self, origin: Vec3, direction: Vec3) -> Option<(f32, f32)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let (o, d) = (origin[axis], direction[axis]);
            let (lo, hi) = (self.start[axis], self.end[axis]);

            if d == 0.0 {
                // Parallel to this slab
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let t0 = (lo - o) / d;
            let t1 = (hi - o) / d;
            t_enter = t_enter.max(t0.min(t1));
            t_exit = t_exit.min(t0.max(t1));
        }

        if t_enter > t_exit {
            return None;
        }
        Some((t_enter, t_exit))
    }
}

#[test]
fn intersect_test() {
    let unit = AABB::ONE_CUBIC_METER;

    let inner = AABB::new(Vec3::splat(0.25), Vec3::splat(0.75));
    assert_eq!(unit.intersect(inner), IntersectType::Contains);

    let shifted = AABB::new(Vec3::splat(0.5), Vec3::splat(1.5));
    assert_eq!(
        unit.intersect(shifted),
        IntersectType::Intersects(AABB::new(Vec3::splat(0.5), Vec3::ONE))
    );

    let outside = AABB::new(Vec3::splat(2.0), Vec3::splat(3.0));
    assert_eq!(unit.intersect(outside), IntersectType::DoesNotIntersect);
}

#[test]
fn ray_intersection_test() {
    let aabb = AABB::new(Vec3::ZERO, Vec3::splat(4.0));

    let (t_enter, t_exit) = aabb.ray_intersection(vec3(2.0, 2.0, -3.0), Vec3::Z).unwrap();
    assert_eq!(t_enter, 3.0);
    assert_eq!(t_exit, 7.0);

    // Origin inside
    let (t_enter, t_exit) = aabb.ray_intersection(vec3(1.0, 1.0, 1.0), Vec3::X).unwrap();
    assert!(t_enter < 0.0);
    assert_eq!(t_exit, 3.0);

    // Parallel and outside
    assert!(aabb.ray_intersection(vec3(5.0, 2.0, -3.0), Vec3::Z).is_none());

    // Diagonal miss
    assert!(aabb.ray_intersection(vec3(-1.0, 5.0, 2.0), vec3(1.0, 1.0, 0.0).normalize()).is_none());
}
